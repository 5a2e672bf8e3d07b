//! Error taxonomy for orchestration runs.
//!
//! Configuration errors are raised before any subordinate build starts.
//! Subordinate failures carry the failing module (or step) and its exit status.
//! Missing API headers are not errors at all; see [`crate::headers`].

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("no buildable modules found under {}", .0.display())]
    NoModules(PathBuf),

    #[error("module directory '{0}' does not yield a usable library name")]
    InvalidModuleName(String),

    #[error("modules '{first}' and '{second}' both normalize to library '{library}'")]
    NameCollision {
        library: String,
        first: String,
        second: String,
    },

    #[error("no server target is configured")]
    NoServer,

    #[error("module '{module}' failed to build ({})", status_text(.code))]
    ModuleBuild {
        module: String,
        code: Option<i32>,
        output: String,
    },

    #[error("module '{module}' reported success but produced no artifact at {}", .path.display())]
    MissingArtifact { module: String, path: PathBuf },

    #[error("{step} failed ({})", status_text(.code))]
    StepFailed {
        step: String,
        code: Option<i32>,
        output: String,
    },

    #[error("failed to launch build in {}: {source}", .dir.display())]
    Spawn {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not start build workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{}", join_errors(.0))]
    Several(Vec<ForgeError>),
}

impl ForgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Collapses a list of failures: none is `Ok`, one is itself.
    pub fn from_many(mut errors: Vec<ForgeError>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Several(errors)),
        }
    }

    /// Subordinate output captured for a failed step, if any.
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            Self::ModuleBuild { output, .. } | Self::StepFailed { output, .. }
                if !output.trim().is_empty() =>
            {
                Some(output.as_str())
            }
            _ => None,
        }
    }

    /// True for errors detected before any subordinate build was invoked.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoModules(_)
                | Self::InvalidModuleName(_)
                | Self::NameCollision { .. }
                | Self::NoServer
        )
    }
}

fn status_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn join_errors(errors: &[ForgeError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
