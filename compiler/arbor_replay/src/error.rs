//! Replay errors.

use std::path::PathBuf;

use arbor_construct::ConstructError;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The script text is malformed.
    #[error("line {line}: {message}")]
    Script { line: usize, message: String },

    /// The engine rejected an action.
    #[error("line {line}: {source}")]
    Action {
        line: usize,
        #[source]
        source: ConstructError,
    },

    /// The stream ended in a state the engine cannot finish from.
    #[error(transparent)]
    Construct(#[from] ConstructError),
}

impl ReplayError {
    pub(crate) fn script(line: usize, message: impl Into<String>) -> Self {
        ReplayError::Script {
            line,
            message: message.into(),
        }
    }
}
