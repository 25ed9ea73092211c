//! Errors raised while loading or validating a mastery snapshot.
//!
//! Layout never fails; these only come from the opt-in checks and the
//! JSON loader in [`crate::mastery`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid mastery tree json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate id in mastery tree: {0}")]
    DuplicateId(String),

    #[error("{field} of {id} is {value}, expected a value in [0, 1]")]
    OutOfRange {
        id: String,
        field: &'static str,
        value: f64,
    },
}
