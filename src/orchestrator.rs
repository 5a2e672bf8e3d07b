//! Target resolution and sequencing.
//!
//! Every request resolves to an ordered combination of four stages:
//! discover → libs (build, sync, header per module) → bin, with the server
//! stage independent of the other three. The libs stage is a join barrier:
//! bin never starts until every module pipeline has finished.

use crate::build::{self, Backend, SharedArtifacts};
use crate::config::{BuildConfig, ForgeConfig, Layout};
use crate::discovery::{self, Module};
use crate::error::{ForgeError, Result};
use crate::headers::{self, HeaderStatus};
use crate::sync::{self, SyncStatus};
use crate::ui::{self, Progress};
use colored::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    All,
    Server,
    Libs,
    Bin,
    Rebuild,
    RebuildLibs,
    RebuildExe,
    Clean,
    CleanLibs,
    CleanExe,
    CleanAll,
    RunExe,
}

impl Target {
    pub fn name(self) -> &'static str {
        match self {
            Target::All => "all",
            Target::Server => "server",
            Target::Libs => "libs",
            Target::Bin => "bin",
            Target::Rebuild => "rebuild",
            Target::RebuildLibs => "rebuild-libs",
            Target::RebuildExe => "rebuild-exe",
            Target::Clean => "clean",
            Target::CleanLibs => "clean-libs",
            Target::CleanExe => "clean-exe",
            Target::CleanAll => "clean-all",
            Target::RunExe => "run-exe",
        }
    }
}

/// What happened to one module during the libs stage.
#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub module: String,
    pub library: String,
    pub shared: PathBuf,
    pub sync: SyncStatus,
    pub header: HeaderStatus,
}

#[derive(Debug, Default)]
pub struct LibsReport {
    pub modules: Vec<ModuleReport>,
}

impl LibsReport {
    /// The link inputs for the consumer.
    pub fn artifacts(&self) -> SharedArtifacts {
        self.modules
            .iter()
            .map(|m| (m.library.clone(), m.shared.clone()))
            .collect()
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        self.modules.iter().filter(|m| m.sync == status).count()
    }

    pub fn missing_headers(&self) -> usize {
        self.modules
            .iter()
            .filter(|m| m.header == HeaderStatus::Missing)
            .count()
    }
}

pub struct Orchestrator<B: Backend> {
    config: ForgeConfig,
    build: BuildConfig,
    layout: Layout,
    backend: B,
    show_progress: bool,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(root: &Path, config: ForgeConfig, build: BuildConfig, backend: B) -> Self {
        let layout = Layout::new(root, &config.layout);
        let show_progress = !build.verbose;
        Self {
            config,
            build,
            layout,
            backend,
            show_progress,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn build_config(&self) -> &BuildConfig {
        &self.build
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn run(&self, target: Target) -> Result<()> {
        tracing::debug!(operation = target.name(), mode = self.build.mode.as_str(), "run");
        match target {
            Target::All => self.all(),
            Target::Server => self.server(),
            Target::Libs => self.libs().map(drop),
            Target::Bin => {
                let libs = self.libs()?;
                self.bin(&libs, false).map(drop)
            }
            Target::Rebuild => {
                let modules = self.plan()?;
                self.clean_all()?;
                self.all_with(&modules)
            }
            Target::RebuildLibs => {
                let modules = self.plan()?;
                self.clean_libs()?;
                self.build_libs(&modules).map(drop)
            }
            Target::RebuildExe => {
                let libs = self.libs()?;
                self.bin(&libs, true).map(drop)
            }
            Target::Clean => self.clean(),
            Target::CleanLibs => self.clean_libs(),
            Target::CleanExe => self.clean_exe(),
            Target::CleanAll => self.clean_all(),
            Target::RunExe => self.run_exe().map(drop),
        }
    }

    /// Modules as currently present on disk, without the build-time checks.
    pub fn modules(&self) -> Result<Vec<Module>> {
        discovery::discover_modules(
            &self.layout.root,
            &discovery::exclusion_set(&self.config),
            &self.config.modules.naming,
        )
    }

    /// Modules for a build run: non-empty and collision-free, or a configuration error.
    fn plan(&self) -> Result<Vec<Module>> {
        discovery::plan_modules(&self.config, &self.layout.root)
    }

    fn all(&self) -> Result<()> {
        let modules = self.plan()?;
        self.all_with(&modules)
    }

    /// (libs → bin) alongside server. Both run even if the other fails.
    fn all_with(&self, modules: &[Module]) -> Result<()> {
        let pipeline = || -> Result<()> {
            let libs = self.build_libs(modules)?;
            self.bin(&libs, false).map(drop)
        };
        let server = || -> Result<()> {
            if self.config.server.enabled {
                self.server()
            } else {
                ui::warn("No server target configured, skipping");
                Ok(())
            }
        };

        let (pipeline_result, server_result) = if self.build.jobs > 1 {
            rayon::join(pipeline, server)
        } else {
            (pipeline(), server())
        };
        ForgeError::from_many(
            pipeline_result
                .err()
                .into_iter()
                .chain(server_result.err())
                .collect(),
        )
    }

    /// Builds, syncs and propagates every module.
    ///
    /// Without `keep_going`, the first failure stops modules that have not started
    /// yet. Libraries already promoted by finished modules stay in place.
    pub fn libs(&self) -> Result<LibsReport> {
        let modules = self.plan()?;
        self.build_libs(&modules)
    }

    fn build_libs(&self, modules: &[Module]) -> Result<LibsReport> {
        ui::step(format!(
            "Building {} module librar{}...",
            modules.len(),
            if modules.len() == 1 { "y" } else { "ies" }
        ));

        let progress = Progress::new(modules.len(), self.show_progress);
        let abort = AtomicBool::new(false);
        let run_one = |module: &Module| -> Option<Result<ModuleReport>> {
            if abort.load(Ordering::SeqCst) {
                return None;
            }
            progress.start(&module.name);
            let result = self.module_pipeline(module, &progress);
            if result.is_err() && !self.build.keep_going {
                abort.store(true, Ordering::SeqCst);
            }
            progress.advance();
            Some(result)
        };

        let results: Vec<Option<Result<ModuleReport>>> = if self.build.jobs <= 1 {
            modules.iter().map(&run_one).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.build.jobs)
                .build()?;
            pool.install(|| modules.par_iter().map(&run_one).collect())
        };
        progress.finish();

        let mut report = LibsReport::default();
        let mut errors = Vec::new();
        for (module, result) in modules.iter().zip(results) {
            match result {
                Some(Ok(module_report)) => report.modules.push(module_report),
                Some(Err(e)) => errors.push(e),
                None => tracing::debug!("{} not started after an earlier failure", module.name),
            }
        }
        errors.iter().for_each(show_output);
        ForgeError::from_many(errors)?;

        ui::success(format!(
            "{} librar{} ready ({} created, {} updated, {} unchanged)",
            report.modules.len(),
            if report.modules.len() == 1 { "y" } else { "ies" },
            report.count(SyncStatus::Created),
            report.count(SyncStatus::Updated),
            report.count(SyncStatus::Unchanged),
        ));
        let missing = report.missing_headers();
        if missing > 0 {
            ui::warn(format!("{missing} module(s) without an API header"));
        }
        Ok(report)
    }

    // Sequential within a module: build, then sync, then header.
    fn module_pipeline(&self, module: &Module, progress: &Progress) -> Result<ModuleReport> {
        let artifact =
            build::build_module(&self.backend, module, &self.config.modules, &self.build)?;

        let shared = module.shared_library(&self.layout);
        let status = sync::sync_artifact(&artifact, &shared)?;
        match status {
            SyncStatus::Unchanged => {
                progress.line(format!("  {} unchanged", module.archive.dimmed()))
            }
            SyncStatus::Created | SyncStatus::Updated => {
                progress.line(format!("  {} {}", "Updating".cyan(), module.archive))
            }
        }

        let header = headers::propagate_header(module, &self.layout)?;
        match header {
            HeaderStatus::Copied => tracing::debug!("updated API header {}", module.header),
            HeaderStatus::Missing => progress.line(format!(
                "  {} {} not found in {}/include/",
                "Warning:".yellow(),
                module.header,
                module.name
            )),
        }

        Ok(ModuleReport {
            module: module.name.clone(),
            library: module.library.clone(),
            shared,
            sync: status,
            header,
        })
    }

    pub fn bin(&self, libs: &LibsReport, force: bool) -> Result<PathBuf> {
        ui::step(format!(
            "{} {} executable...",
            if force { "Force rebuilding" } else { "Building" },
            self.config.consumer.dir
        ));
        let binary = build::build_binary(
            &self.backend,
            &self.layout,
            &self.config.consumer,
            &self.config.modules,
            &self.build,
            &libs.artifacts(),
            force,
        )
        .inspect_err(show_output)?;
        ui::success(format!("Executable ready at {}", self.relative(&binary)));
        Ok(binary)
    }

    pub fn server(&self) -> Result<()> {
        ui::step("Building dedicated server...");
        build::build_server(&self.backend, &self.layout, &self.config.server, &self.build)
            .inspect_err(show_output)?;
        ui::success("Server ready");
        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        if build::remove_dir(&self.layout.build_dir)? {
            ui::success(format!("Removed {}", self.relative(&self.layout.build_dir)));
        } else {
            ui::warn("Nothing to clean");
        }
        Ok(())
    }

    pub fn clean_libs(&self) -> Result<()> {
        let delegated = self.delegate_clean();
        if build::remove_dir(&self.layout.lib_dir)? {
            ui::success(format!("Removed {}", self.relative(&self.layout.lib_dir)));
        }
        delegated
    }

    pub fn clean_exe(&self) -> Result<()> {
        if build::remove_dir(&self.layout.bin_dir)? {
            ui::success(format!("Removed {}", self.relative(&self.layout.bin_dir)));
        } else {
            ui::warn("No executable to clean");
        }
        Ok(())
    }

    pub fn clean_all(&self) -> Result<()> {
        self.clean()?;
        self.delegate_clean()
    }

    /// Every module plus the consumer, whether or not they have build output.
    fn delegate_clean(&self) -> Result<()> {
        let mut dirs: Vec<PathBuf> = self.modules()?.into_iter().map(|m| m.dir).collect();
        dirs.push(self.layout.root.join(&self.config.consumer.dir));

        let cleaned = build::delegate_clean(
            &self.backend,
            &dirs,
            &self.config.modules.clean_target,
            &self.build,
        )
        .inspect_err(show_output)?;
        for dir in &cleaned {
            ui::success(format!("Cleaned {}", self.relative(dir)));
        }
        Ok(())
    }

    /// Runs the linked executable from the project root. Returns `false` (after
    /// telling the user how to build it) when there is nothing to run.
    pub fn run_exe(&self) -> Result<bool> {
        let binary = self.layout.binary_path(&self.build);
        if !binary.is_file() {
            ui::warn(format!(
                "No executable found at {}",
                self.relative(&binary)
            ));
            println!(
                "   Run '{}' or '{}' first.",
                "mf bin".bold(),
                "mf rebuild-exe".bold()
            );
            return Ok(false);
        }

        ui::step(format!("Running {}...", self.relative(&binary)));
        let status = Command::new(&binary)
            .current_dir(&self.layout.root)
            .status()
            .map_err(|source| ForgeError::Spawn {
                dir: self.layout.root.clone(),
                source,
            })?;
        if status.success() {
            Ok(true)
        } else {
            Err(ForgeError::StepFailed {
                step: "run-exe".to_string(),
                code: status.code(),
                output: String::new(),
            })
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.layout.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn show_output(err: &ForgeError) {
    match err {
        ForgeError::Several(errors) => errors.iter().for_each(show_output),
        _ => {
            if let Some(output) = err.captured_output() {
                ui::captured(output);
            }
        }
    }
}
