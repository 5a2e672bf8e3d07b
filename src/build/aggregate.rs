//! Consumer executable and server builds.
//!
//! The consumer links every promoted library, so it only runs after the libs
//! stage has synced all modules. The server build is independent of both.

use super::backend::{Backend, Invocation};
use crate::config::{BuildConfig, ConsumerSection, Layout, ModulesSection, ServerSection};
use crate::error::{ForgeError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Promoted libraries keyed by library name.
pub type SharedArtifacts = BTreeMap<String, PathBuf>;

/// `../` repeated once per component of `dir`, so root-relative paths can be
/// expressed from inside it.
fn up_to_root(dir: &Path) -> PathBuf {
    dir.components().map(|_| Path::new("..")).collect()
}

/// Re-expresses `path` (under the project root) relative to the consumer directory.
fn from_consumer(layout: &Layout, consumer: &Path, path: &Path) -> PathBuf {
    let rel = path.strip_prefix(&layout.root).unwrap_or(path);
    up_to_root(consumer).join(rel)
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

pub fn binary_invocation(
    layout: &Layout,
    consumer: &ConsumerSection,
    modules: &ModulesSection,
    config: &BuildConfig,
    artifacts: &SharedArtifacts,
    force: bool,
) -> Invocation {
    let consumer_dir = Path::new(&consumer.dir);

    let mut cflags = vec![format!(
        "-D{}=\"{}/assets/\"",
        modules.asset_define, consumer.dir
    )];
    cflags.extend(
        consumer
            .include_dirs
            .iter()
            .map(|inc| format!("-I{}", display(&up_to_root(consumer_dir).join(inc)))),
    );

    let ldflags: Vec<String> = artifacts
        .values()
        .map(|lib| display(&from_consumer(layout, consumer_dir, lib)))
        .collect();

    let invocation = Invocation::new(layout.root.join(consumer_dir));
    let invocation = if force {
        invocation.target(&consumer.rebuild_target)
    } else if let Some(target) = &consumer.target {
        invocation.target(target)
    } else {
        invocation
    };

    invocation
        .var("MODE", config.mode.as_str())
        .var("VERBOSE", config.verbose_flag())
        .var("MAIN_NAME", &config.main_name)
        .var(
            "BIN_DIR",
            display(&from_consumer(layout, consumer_dir, &layout.bin_dir)),
        )
        .var("EXTRA_CFLAGS", cflags.join(" "))
        .var("EXTRA_LDFLAGS", ldflags.join(" "))
}

/// Links the consumer executable against `artifacts`.
///
/// With `force`, any existing binary is removed first so the consumer's build
/// cannot treat a stale output as up to date. A zero exit that leaves no binary
/// behind is a [`ForgeError::MissingArtifact`].
pub fn build_binary<B: Backend + ?Sized>(
    backend: &B,
    layout: &Layout,
    consumer: &ConsumerSection,
    modules: &ModulesSection,
    config: &BuildConfig,
    artifacts: &SharedArtifacts,
    force: bool,
) -> Result<PathBuf> {
    let binary = layout.binary_path(config);
    if force {
        match fs::remove_file(&binary) {
            Ok(()) => tracing::debug!("removed {}", binary.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(ForgeError::io(&binary, e)),
        }
    }
    fs::create_dir_all(&layout.bin_dir).map_err(|e| ForgeError::io(&layout.bin_dir, e))?;

    let invocation = binary_invocation(layout, consumer, modules, config, artifacts, force);
    run_step(backend, &invocation, "bin")?;

    if !binary.is_file() {
        return Err(ForgeError::MissingArtifact {
            module: consumer.dir.clone(),
            path: binary,
        });
    }
    Ok(binary)
}

pub fn build_server<B: Backend + ?Sized>(
    backend: &B,
    layout: &Layout,
    server: &ServerSection,
    config: &BuildConfig,
) -> Result<()> {
    if !server.enabled {
        return Err(ForgeError::NoServer);
    }
    let invocation = Invocation::new(layout.root.join(&server.dir))
        .target(&server.target)
        .var("MODE", config.mode.as_str())
        .var("VERBOSE", config.verbose_flag());
    run_step(backend, &invocation, "server")
}

fn run_step<B: Backend + ?Sized>(backend: &B, invocation: &Invocation, step: &str) -> Result<()> {
    let outcome = backend
        .invoke(invocation)
        .map_err(|source| ForgeError::Spawn {
            dir: invocation.dir.clone(),
            source,
        })?;
    if !outcome.stdout.is_empty() {
        tracing::debug!(step, "{}", outcome.stdout.trim_end());
    }
    if outcome.success() {
        Ok(())
    } else {
        Err(ForgeError::StepFailed {
            step: step.to_string(),
            code: outcome.code,
            output: outcome.combined_output(),
        })
    }
}
