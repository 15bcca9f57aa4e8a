//! eQR runtime - turns a decoded payload into practice exercises.
//!
//! Binds random variables, substitutes them into exercise templates,
//! filters by tag and checks answers through the eqr_vm compiler and VM.

pub mod config;
pub mod error;
pub mod report;
pub mod session;
pub mod tags;
pub mod template;
pub mod validate;

pub use config::SessionConfig;
pub use error::{Result, RuntimeError};
pub use report::{ExerciseInstance, ExerciseReport, VerificationResult};
pub use session::Session;
pub use tags::{available_tags, primary_tag};
pub use validate::validate_payload;
