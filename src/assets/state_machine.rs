use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EngineError, Result};

/// Value types an animation parameter can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
}

/// A concrete parameter value, as authored in a condition or stored in a
/// controller slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

impl ParameterValue {
    /// Zero/false default for a freshly instantiated parameter slot.
    #[must_use]
    pub fn default_for(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Bool => Self::Bool(false),
            ParameterKind::Int => Self::Int(0),
            ParameterKind::Float => Self::Float(0.0),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Bool(_) => ParameterKind::Bool,
            Self::Int(_) => ParameterKind::Int,
            Self::Float(_) => ParameterKind::Float,
        }
    }
}

/// Comparison applied between a stored parameter and a condition's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

/// One comparison a transition requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Parameter name this condition reads.
    pub parameter: String,
    pub predicate: Predicate,
    pub value: ParameterValue,
}

/// Directed edge between two states.
///
/// A transition with `on_finish` fires when the current clip reports
/// finished and its conditions are ignored. Otherwise it fires when its
/// conditions hold, combined with AND by default or OR when `any` is set.
/// A transition with neither never fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub target: String,
    #[serde(default)]
    pub on_finish: bool,
    #[serde(default)]
    pub any: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// One state: the clip it plays and its outgoing transitions in priority
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub name: String,
    pub clip: String,
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// One declared parameter slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

/// Authored animation state machine.
///
/// The first declared state is the start state. Transition evaluation is
/// deterministic: a state's transitions are tested in declared order and the
/// first satisfied one wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMachineAsset {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub states: Vec<State>,
}

impl StateMachineAsset {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            parameters: Vec::new(),
            states: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.iter().find(|s| s.name == name)
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Structural validation, run at registration.
    ///
    /// Duplicate state or parameter names make transition targets and
    /// condition lookups ambiguous and are rejected. Dangling references
    /// (unknown targets, unknown or type-mismatched condition parameters)
    /// only log a warning here: at runtime they evaluate as "condition not
    /// satisfied", which is the tolerant behavior gameplay code relies on.
    pub fn validate(&self) -> Result<()> {
        if self.states.is_empty() {
            return Err(EngineError::InvalidStateMachine(format!(
                "{:?} declares no states",
                self.name
            )));
        }
        for (i, state) in self.states.iter().enumerate() {
            if self.states[..i].iter().any(|s| s.name == state.name) {
                return Err(EngineError::InvalidStateMachine(format!(
                    "{:?}: duplicate state name {:?}",
                    self.name, state.name
                )));
            }
        }
        for (i, param) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(EngineError::InvalidStateMachine(format!(
                    "{:?}: duplicate parameter name {:?}",
                    self.name, param.name
                )));
            }
        }

        for state in &self.states {
            for transition in &state.transitions {
                if self.state(&transition.target).is_none() {
                    log::warn!(
                        "State machine {:?}: transition {:?} -> {:?} targets an unknown state",
                        self.name,
                        state.name,
                        transition.target
                    );
                }
                if !transition.on_finish && transition.conditions.is_empty() {
                    log::warn!(
                        "State machine {:?}: transition {:?} -> {:?} has no trigger and will never fire",
                        self.name,
                        state.name,
                        transition.target
                    );
                }
                for condition in &transition.conditions {
                    match self.parameter(&condition.parameter) {
                        None => log::warn!(
                            "State machine {:?}: condition in {:?} reads unknown parameter {:?}",
                            self.name,
                            state.name,
                            condition.parameter
                        ),
                        Some(param) if condition.value.kind() != param.kind => log::warn!(
                            "State machine {:?}: condition on {:?} compares {:?} against a {:?} parameter",
                            self.name,
                            condition.parameter,
                            condition.value.kind(),
                            param.kind
                        ),
                        Some(_) => {}
                    }
                }
            }
        }

        Ok(())
    }
}
