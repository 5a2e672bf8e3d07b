//! The seam between the orchestrator and each directory's own build procedure.
//!
//! Subordinate builds are opaque: the orchestrator only describes *what* to run
//! (directory, target, variable overrides) and looks at the exit status. The real
//! implementation shells out to `make`; tests swap in a fake.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One subordinate build request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub dir: PathBuf,
    pub target: Option<String>,
    pub vars: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            target: None,
            vars: Vec::new(),
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.push((key.to_string(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-C {}", self.dir.display())?;
        if let Some(target) = &self.target {
            write!(f, " {target}")?;
        }
        for (key, value) in &self.vars {
            write!(f, " {key}={value:?}")?;
        }
        Ok(())
    }
}

/// Result of a finished subordinate build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Everything the subordinate printed, stdout first.
    pub fn combined_output(&self) -> String {
        let mut out = self.stdout.clone();
        if !out.is_empty() && !out.ends_with('\n') && !self.stderr.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.stderr);
        out
    }
}

pub trait Backend: Sync {
    /// Whether `dir` has a build procedure this backend can drive.
    fn is_buildable(&self, dir: &Path) -> bool;

    /// Runs the invocation to completion. `Err` only when it could not be started.
    fn invoke(&self, invocation: &Invocation) -> io::Result<Outcome>;
}

/// Drives `make -C <dir>` with `KEY=VALUE` overrides.
#[derive(Debug, Clone)]
pub struct MakeBackend {
    program: String,
}

impl MakeBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C")
            .arg(&invocation.dir)
            .arg("--no-print-directory");
        if let Some(target) = &invocation.target {
            cmd.arg(target);
        }
        for (key, value) in &invocation.vars {
            cmd.arg(format!("{key}={value}"));
        }
        cmd
    }
}

impl Default for MakeBackend {
    fn default() -> Self {
        Self::new("make")
    }
}

impl Backend for MakeBackend {
    fn is_buildable(&self, dir: &Path) -> bool {
        ["GNUmakefile", "makefile", "Makefile"]
            .iter()
            .any(|name| dir.join(name).is_file())
    }

    fn invoke(&self, invocation: &Invocation) -> io::Result<Outcome> {
        tracing::debug!("{} {}", self.program, invocation);
        let output = self.command(invocation).output()?;
        Ok(Outcome {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_make_command_line() {
        let inv = Invocation::new("/p/Audio")
            .target("static-lib")
            .var("MODE", "release")
            .var("LIB_NAME", "audio");
        let cmd = MakeBackend::default().command(&inv);
        let args: Vec<_> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(cmd.get_program(), "make");
        assert_eq!(
            args,
            vec![
                "-C",
                "/p/Audio",
                "--no-print-directory",
                "static-lib",
                "MODE=release",
                "LIB_NAME=audio",
            ]
        );
    }

    #[test]
    fn test_is_buildable_requires_makefile() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MakeBackend::default();
        assert!(!backend.is_buildable(dir.path()));
        fs::write(dir.path().join("Makefile"), "all:\n").unwrap();
        assert!(backend.is_buildable(dir.path()));
    }

    #[test]
    fn test_spawn_failure_is_io_error() {
        let backend = MakeBackend::new("definitely-not-a-real-make-binary");
        assert!(backend.invoke(&Invocation::new(".")).is_err());
    }

    #[test]
    fn test_invocation_lookup_and_display() {
        let inv = Invocation::new("lobby").var("BIN_DIR", "../build/bin");
        assert_eq!(inv.get("BIN_DIR"), Some("../build/bin"));
        assert_eq!(inv.get("MODE"), None);
        assert_eq!(inv.to_string(), "-C lobby BIN_DIR=\"../build/bin\"");
    }

    #[test]
    fn test_outcome_success_and_output() {
        let outcome = Outcome {
            code: Some(0),
            stdout: "ar rcs".into(),
            stderr: "warning".into(),
        };
        assert!(outcome.success());
        assert_eq!(outcome.combined_output(), "ar rcs\nwarning");
        assert!(!Outcome::default().success());
    }
}
