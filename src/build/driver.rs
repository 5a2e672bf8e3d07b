use super::backend::{Backend, Invocation};
use crate::config::{BuildConfig, ModulesSection};
use crate::discovery::Module;
use crate::error::{ForgeError, Result};
use std::path::PathBuf;

/// The isolated configuration handed to one module's build.
pub fn module_invocation(
    module: &Module,
    section: &ModulesSection,
    config: &BuildConfig,
) -> Invocation {
    Invocation::new(&module.dir)
        .target(&section.target)
        .var("MODE", config.mode.as_str())
        .var("VERBOSE", config.verbose_flag())
        .var("LIB_NAME", &module.library)
        .var(
            "EXTRA_CFLAGS",
            format!("-D{}=\"{}/assets/\"", section.asset_define, module.name),
        )
}

/// Builds one module's library and returns the module-local artifact path.
///
/// Blocks until the subordinate build exits. A zero exit without the expected
/// artifact breaks the subordinate contract and is reported as such.
pub fn build_module<B: Backend + ?Sized>(
    backend: &B,
    module: &Module,
    section: &ModulesSection,
    config: &BuildConfig,
) -> Result<PathBuf> {
    let invocation = module_invocation(module, section, config);
    let outcome = backend
        .invoke(&invocation)
        .map_err(|source| ForgeError::Spawn {
            dir: module.dir.clone(),
            source,
        })?;

    if !outcome.stdout.is_empty() {
        tracing::debug!(module = %module.name, "{}", outcome.stdout.trim_end());
    }
    if !outcome.success() {
        return Err(ForgeError::ModuleBuild {
            module: module.name.clone(),
            code: outcome.code,
            output: outcome.combined_output(),
        });
    }

    let artifact = module.artifact_path();
    if !artifact.is_file() {
        return Err(ForgeError::MissingArtifact {
            module: module.name.clone(),
            path: artifact,
        });
    }
    Ok(artifact)
}
