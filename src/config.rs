use crate::naming::NameScheme;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "forge.toml";

/// Contents of `forge.toml`. Every section is optional; defaults describe the
/// conventional layout (modules next to a `lobby` consumer and a `reseau` server).
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ForgeConfig {
    pub build: BuildSection,
    pub layout: LayoutSection,
    pub modules: ModulesSection,
    pub consumer: ConsumerSection,
    pub server: ServerSection,
    pub tool: ToolSection,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct BuildSection {
    pub mode: Option<Mode>,
    pub verbose: Option<bool>,
    pub main_name: Option<String>,
    pub jobs: Option<usize>,
    pub keep_going: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct LayoutSection {
    pub build_dir: PathBuf,
    pub api_dir: PathBuf,
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            api_dir: PathBuf::from("firstparty").join("APIs"),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct ModulesSection {
    pub exclude: Vec<String>,
    pub target: String,
    pub clean_target: String,
    pub asset_define: String,
    #[serde(flatten)]
    pub naming: NameScheme,
}

impl Default for ModulesSection {
    fn default() -> Self {
        Self {
            exclude: [
                "assets",
                "build",
                "docs",
                "firstparty",
                "lobby",
                "logs",
                "thirdparty",
                "tui-ver",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            target: "static-lib".to_string(),
            clean_target: "clean".to_string(),
            asset_define: "ASSET_PATH".to_string(),
            naming: NameScheme::default(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct ConsumerSection {
    pub dir: String,
    /// Extra include directories, relative to the project root.
    pub include_dirs: Vec<PathBuf>,
    pub target: Option<String>,
    pub rebuild_target: String,
}

impl Default for ConsumerSection {
    fn default() -> Self {
        Self {
            dir: "lobby".to_string(),
            include_dirs: vec![PathBuf::from("reseau").join("include")],
            target: None,
            rebuild_target: "rebuild".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct ServerSection {
    pub enabled: bool,
    pub dir: String,
    pub target: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "reseau".to_string(),
            target: "server".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct ToolSection {
    pub make: String,
}

impl Default for ToolSection {
    fn default() -> Self {
        Self {
            make: "make".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Release,
    Debug,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Release => "release",
            Mode::Debug => "debug",
        }
    }
}

/// Settings given on the command line; `None` falls back to `forge.toml`.
#[derive(Debug, Default, Clone)]
pub struct BuildOverrides {
    pub mode: Option<Mode>,
    pub verbose: bool,
    pub main_name: Option<String>,
    pub jobs: Option<usize>,
    pub keep_going: bool,
}

/// Per-run build settings. Resolved once and passed by reference to every
/// subordinate invocation; nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub mode: Mode,
    pub verbose: bool,
    pub main_name: String,
    pub jobs: usize,
    pub keep_going: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Release,
            verbose: false,
            main_name: "main".to_string(),
            jobs: 1,
            keep_going: false,
        }
    }
}

impl BuildConfig {
    pub fn resolve(file: &BuildSection, cli: &BuildOverrides) -> Self {
        let defaults = Self::default();
        Self {
            mode: cli.mode.or(file.mode).unwrap_or(defaults.mode),
            verbose: cli.verbose || file.verbose.unwrap_or(defaults.verbose),
            main_name: cli
                .main_name
                .clone()
                .or_else(|| file.main_name.clone())
                .unwrap_or(defaults.main_name),
            jobs: cli.jobs.or(file.jobs).unwrap_or(defaults.jobs).max(1),
            keep_going: cli.keep_going || file.keep_going.unwrap_or(defaults.keep_going),
        }
    }

    /// Value passed as `VERBOSE=` to subordinate builds.
    pub fn verbose_flag(&self) -> &'static str {
        if self.verbose { "1" } else { "0" }
    }
}

/// Shared directories owned by the orchestrator.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub build_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub api_dir: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, section: &LayoutSection) -> Self {
        let build_dir = root.join(&section.build_dir);
        Self {
            root: root.to_path_buf(),
            lib_dir: build_dir.join("lib"),
            bin_dir: build_dir.join("bin"),
            build_dir,
            api_dir: root.join(&section.api_dir),
        }
    }

    pub fn binary_path(&self, config: &BuildConfig) -> PathBuf {
        let name = if cfg!(target_os = "windows") {
            format!("{}.exe", config.main_name)
        } else {
            config.main_name.clone()
        };
        self.bin_dir.join(name)
    }
}

/// Loads `forge.toml` from the project root, or the defaults when it is absent.
pub fn load_config(root: &Path) -> Result<ForgeConfig> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, root.display());
        return Ok(ForgeConfig::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| {
        format!(
            "Failed to parse {} - check for syntax errors (missing quotes, brackets)",
            path.display()
        )
    })
}
