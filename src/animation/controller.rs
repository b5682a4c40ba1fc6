use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::assets::state_machine::{
    Condition, ParameterValue, Predicate, State, StateMachineAsset,
};

/// Runtime instance of an animation state machine.
///
/// Holds one value slot per declared parameter and the index of the active
/// state. The controller decides which state is active; actually starting
/// the state's clip is the owning animator's job, so the controller never
/// touches playback directly.
pub struct AnimationController {
    asset: Arc<StateMachineAsset>,
    current: Option<usize>,
    parameters: FxHashMap<String, ParameterValue>,
}

impl AnimationController {
    /// Instantiates the machine in its first declared state with every
    /// parameter at zero/false.
    #[must_use]
    pub fn new(asset: Arc<StateMachineAsset>) -> Self {
        let parameters = asset
            .parameters
            .iter()
            .map(|p| (p.name.clone(), ParameterValue::default_for(p.kind)))
            .collect();
        let current = if asset.states.is_empty() { None } else { Some(0) };
        Self {
            asset,
            current,
            parameters,
        }
    }

    #[must_use]
    pub fn asset(&self) -> &Arc<StateMachineAsset> {
        &self.asset
    }

    #[must_use]
    pub fn current_state(&self) -> Option<&State> {
        self.current.and_then(|i| self.asset.states.get(i))
    }

    /// Current value of a parameter slot.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).copied()
    }

    /// Writes a parameter slot. Returns false without writing when the name
    /// is unknown or the stored type differs, so a typo in gameplay code
    /// cannot corrupt a slot or trigger transitions.
    pub(crate) fn set_parameter(&mut self, name: &str, value: ParameterValue) -> bool {
        match self.parameters.get_mut(name) {
            Some(slot) if slot.kind() == value.kind() => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// Tests the active state's transitions in declared order and switches
    /// to the first one that fires. Returns whether a switch happened;
    /// evaluation stops at the first hit, so later transitions never race
    /// an earlier satisfiable one.
    pub(crate) fn evaluate_transitions(&mut self, finished: bool) -> bool {
        self.evaluate(finished, false)
    }

    /// Like [`evaluate_transitions`](Self::evaluate_transitions) but only
    /// considers finish-triggered transitions. Run once per tick after pose
    /// evaluation; parameter-conditioned transitions are evaluated at write
    /// time instead, so a condition that stays true does not re-fire every
    /// tick and restart its target clip.
    pub(crate) fn evaluate_finish_transitions(&mut self, finished: bool) -> bool {
        self.evaluate(finished, true)
    }

    fn evaluate(&mut self, finished: bool, finish_only: bool) -> bool {
        let asset = self.asset.clone();
        let Some(state) = self.current.and_then(|i| asset.states.get(i)) else {
            return false;
        };

        for transition in &state.transitions {
            let fires = if transition.on_finish {
                finished
            } else if finish_only || transition.conditions.is_empty() {
                false
            } else if transition.any {
                transition.conditions.iter().any(|c| self.condition_met(c))
            } else {
                transition.conditions.iter().all(|c| self.condition_met(c))
            };
            if !fires {
                continue;
            }

            // A dangling target means this transition can never complete;
            // treat it as not satisfied and keep scanning.
            let Some(target) = asset.states.iter().position(|s| s.name == transition.target)
            else {
                continue;
            };

            self.current = Some(target);
            return true;
        }
        false
    }

    fn condition_met(&self, condition: &Condition) -> bool {
        let Some(stored) = self.parameters.get(&condition.parameter) else {
            return false;
        };
        match (*stored, condition.value) {
            (ParameterValue::Bool(a), ParameterValue::Bool(b)) => match condition.predicate {
                Predicate::Equal => a == b,
                Predicate::NotEqual => a != b,
                // Ordering comparisons are undefined for booleans.
                _ => false,
            },
            (ParameterValue::Int(a), ParameterValue::Int(b)) => ordered(a, condition.predicate, b),
            (ParameterValue::Float(a), ParameterValue::Float(b)) => {
                ordered(a, condition.predicate, b)
            }
            _ => false,
        }
    }
}

fn ordered<T: PartialOrd>(a: T, predicate: Predicate, b: T) -> bool {
    match predicate {
        Predicate::Equal => a == b,
        Predicate::NotEqual => a != b,
        Predicate::Greater => a > b,
        Predicate::GreaterOrEqual => a >= b,
        Predicate::Less => a < b,
        Predicate::LessOrEqual => a <= b,
    }
}
