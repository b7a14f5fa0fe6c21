//! Assertion gate - Typed expectations over page observations
//!
//! This crate turns assertion commands into checks that run locally:
//! - [`Expectation`] closed set, one variant per assertion kind
//! - [`Observation`] of the page state an expectation needs
//! - [`Verdict`] with expected/actual wording for failure analysis
//! - [`GatedExecutor`] evaluating assertions and delegating everything else

pub mod conditions;
pub mod errors;
pub mod types;
pub mod validator;

pub use conditions::*;
pub use errors::*;
pub use types::*;
pub use validator::*;
