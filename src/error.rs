//! Error kinds surfaced by library assembly, generic encoding, and backend
//! invocation.
//!
//! Per-test logical failures are not errors here; they are backend results
//! carried in [`crate::backend::TestOutcome`].
use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for harness setup and execution.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// An explicit (non-wildcard) source location does not exist.
    #[error("source not found: '{}'", path.display())]
    Resolution { path: PathBuf },

    /// A directory could not be read while expanding a wildcard pattern.
    #[error("expand pattern {pattern:?}: {source}")]
    PatternIo {
        pattern: String,
        #[source]
        source: std::io::Error,
    },

    /// A wildcard pattern is malformed (for example an unclosed `[`).
    #[error("invalid pattern {pattern:?}: {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// A library name is not a valid identifier or is reserved.
    #[error("invalid library name {name:?}: {detail}")]
    InvalidLibraryName { name: String, detail: String },

    /// A generic has no canonical string form, or breaks the delimiter policy.
    #[error("cannot encode generic {name:?}: {detail}")]
    Encoding { name: String, detail: String },

    /// A generic name appears twice in one configuration.
    #[error("duplicate generic {name:?}")]
    DuplicateGeneric { name: String },

    /// The backend program could not be resolved or started.
    #[error("backend invocation failed for {program:?}: {detail}")]
    BackendInvocation { program: String, detail: String },
}

impl HarnessError {
    pub(crate) fn encoding(name: &str, detail: impl Into<String>) -> Self {
        HarnessError::Encoding {
            name: name.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn backend(program: &str, detail: impl Into<String>) -> Self {
        HarnessError::BackendInvocation {
            program: program.to_string(),
            detail: detail.into(),
        }
    }

    /// True when the error is fatal for the whole run rather than one test.
    pub fn aborts_run(&self) -> bool {
        !matches!(
            self,
            HarnessError::Encoding { .. } | HarnessError::DuplicateGeneric { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;
