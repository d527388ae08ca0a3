//! Build errors for handler builders.

use thiserror::Error;

/// Errors that can occur when building transitions and activities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Transition target not specified. Call .to(state) before .build()")]
    MissingTarget,

    #[error("Activity action not specified. Call .action(action) or .run(closure)")]
    MissingAction,
}
