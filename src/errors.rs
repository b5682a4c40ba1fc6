//! Error Types
//!
//! This module defines the error types used throughout the runtime.
//!
//! # Overview
//!
//! The main error type [`EngineError`] covers failures at the constructive
//! edges of the API:
//! - Asset registration and lookup
//! - Skeleton and state-machine data validation
//! - Clip resolution by name
//!
//! Per-frame paths (pose evaluation, bone-matrix updates, draw submission)
//! never return errors; they degrade locally and retry from current state on
//! the next tick.
//!
//! # Usage
//!
//! Fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, EngineError>`.
//!
//! ```rust,ignore
//! use marionette::errors::{EngineError, Result};
//!
//! fn register_assets() -> Result<()> {
//!     // Operations that may fail return Result
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the runtime.
///
/// Each variant provides specific context about what went wrong.
#[derive(Error, Debug)]
pub enum EngineError {
    // ========================================================================
    // Asset Lookup Errors
    // ========================================================================
    /// The requested asset id is not registered in the cache.
    #[error("Asset not found: {0}")]
    AssetNotFound(uuid::Uuid),

    /// The named animation clip does not exist in the animator's library.
    #[error("Unknown animation clip: {0}")]
    UnknownClip(String),

    // ========================================================================
    // Asset Validation Errors
    // ========================================================================
    /// Skeleton asset data is internally inconsistent.
    #[error("Invalid skeleton data: {0}")]
    InvalidSkeletonData(String),

    /// Animation clip data is internally inconsistent.
    #[error("Invalid clip data: {0}")]
    InvalidClipData(String),

    /// State-machine asset data is internally inconsistent.
    #[error("Invalid state machine: {0}")]
    InvalidStateMachine(String),
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
