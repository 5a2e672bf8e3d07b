//! Module discovery.
//!
//! Modules are the immediate subdirectories of the project root, minus an
//! exclusion set of infrastructure directories. Results are sorted by name so
//! logs are reproducible from run to run.

use crate::config::{ForgeConfig, Layout};
use crate::error::{ForgeError, Result};
use crate::naming::{self, NameScheme};
use std::collections::BTreeSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Module-local directory holding the subordinate build's library.
const MODULE_LIB_DIR: [&str; 2] = ["build", "lib"];
/// Module-local public include area.
const MODULE_INCLUDE_DIR: &str = "include";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Directory name; the module's identity.
    pub name: String,
    pub dir: PathBuf,
    pub library: String,
    pub archive: String,
    pub header: String,
}

impl Module {
    pub fn new(root: &Path, name: &str, scheme: &NameScheme) -> Self {
        let library = naming::library_name(name);
        Self {
            name: name.to_string(),
            dir: root.join(name),
            archive: scheme.archive_name(&library),
            header: scheme.header_name(&library),
            library,
        }
    }

    /// Where the module's own build leaves its library.
    pub fn artifact_path(&self) -> PathBuf {
        MODULE_LIB_DIR
            .iter()
            .fold(self.dir.clone(), |p, c| p.join(c))
            .join(&self.archive)
    }

    pub fn header_source(&self) -> PathBuf {
        self.dir.join(MODULE_INCLUDE_DIR).join(&self.header)
    }

    pub fn shared_library(&self, layout: &Layout) -> PathBuf {
        layout.lib_dir.join(&self.archive)
    }

    pub fn shared_header(&self, layout: &Layout) -> PathBuf {
        layout.api_dir.join(&self.header)
    }
}

/// The configured exclusions plus the consumer and the top-level directories
/// holding the build root and the API staging area.
pub fn exclusion_set(config: &ForgeConfig) -> BTreeSet<String> {
    let mut excluded: BTreeSet<String> = config.modules.exclude.iter().cloned().collect();
    excluded.insert(config.consumer.dir.clone());
    for owned in [&config.layout.build_dir, &config.layout.api_dir] {
        if let Some(Component::Normal(first)) = owned.components().next() {
            excluded.insert(first.to_string_lossy().into_owned());
        }
    }
    excluded
}

/// Lists module directories under `root`. May be empty.
pub fn discover_modules(
    root: &Path,
    excluded: &BTreeSet<String>,
    scheme: &NameScheme,
) -> Result<Vec<Module>> {
    let mut modules = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Dangling symlink
            Err(e) if e.io_error().is_some_and(|io| io.kind() == io::ErrorKind::NotFound) => {
                tracing::trace!("skipping unreadable entry {}", e.path().unwrap_or(root).display());
                continue;
            }
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                return Err(ForgeError::io(path, e.into()));
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            return Err(ForgeError::InvalidModuleName(
                entry.file_name().to_string_lossy().into_owned(),
            ));
        };
        if name.starts_with('.') || excluded.contains(name) {
            tracing::trace!("skipping directory {}", name);
            continue;
        }
        modules.push(Module::new(root, name, scheme));
    }

    tracing::debug!(
        "discovered {} module(s): {:?}",
        modules.len(),
        modules.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
    );
    Ok(modules)
}

/// Discovery for build operations: the set must be non-empty and collision-free.
pub fn plan_modules(config: &ForgeConfig, root: &Path) -> Result<Vec<Module>> {
    let modules = discover_modules(root, &exclusion_set(config), &config.modules.naming)?;
    if modules.is_empty() {
        return Err(ForgeError::NoModules(root.to_path_buf()));
    }
    naming::check_collisions(&modules)?;
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutSection;
    use std::fs;

    fn make_dirs(root: &Path, names: &[&str]) {
        for name in names {
            fs::create_dir_all(root.join(name)).unwrap();
        }
    }

    fn names(modules: &[Module]) -> Vec<&str> {
        modules.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_excludes_configured_directories() {
        let dir = tempfile::tempdir().unwrap();
        make_dirs(
            dir.path(),
            &["tetris", "lobby", "thirdparty", "build", "snake", "docs"],
        );
        fs::write(dir.path().join("Makefile"), "all:\n").unwrap();

        let config = ForgeConfig::default();
        let modules = discover_modules(
            dir.path(),
            &exclusion_set(&config),
            &config.modules.naming,
        )
        .unwrap();
        assert_eq!(names(&modules), vec!["snake", "tetris"]);
    }

    #[test]
    fn test_order_is_independent_of_creation_order() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        make_dirs(a.path(), &["uno", "Crazy_8", "echecs"]);
        make_dirs(b.path(), &["echecs", "uno", "Crazy_8"]);

        let excluded = BTreeSet::new();
        let scheme = NameScheme::default();
        let first = discover_modules(a.path(), &excluded, &scheme).unwrap();
        let second = discover_modules(b.path(), &excluded, &scheme).unwrap();
        assert_eq!(names(&first), names(&second));
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let dir = tempfile::tempdir().unwrap();
        make_dirs(dir.path(), &[".git", "cube"]);
        let modules =
            discover_modules(dir.path(), &BTreeSet::new(), &NameScheme::default()).unwrap();
        assert_eq!(names(&modules), vec!["cube"]);
    }

    #[test]
    fn test_consumer_always_excluded() {
        let mut config = ForgeConfig::default();
        config.modules.exclude.clear();
        config.consumer.dir = "launcher".into();
        let excluded = exclusion_set(&config);
        assert!(excluded.contains("launcher"));
        assert!(excluded.contains("build"));
    }

    #[test]
    fn test_api_staging_root_always_excluded() {
        let mut config = ForgeConfig::default();
        config.modules.exclude.clear();
        config.layout.api_dir = PathBuf::from("staging").join("APIs");
        assert!(exclusion_set(&config).contains("staging"));

        let dir = tempfile::tempdir().unwrap();
        make_dirs(dir.path(), &["staging/APIs", "uno"]);
        let modules = discover_modules(
            dir.path(),
            &exclusion_set(&config),
            &config.modules.naming,
        )
        .unwrap();
        assert_eq!(names(&modules), vec!["uno"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_skipped() {
        let dir = tempfile::tempdir().unwrap();
        make_dirs(dir.path(), &["cube", "snake"]);
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("broken")).unwrap();

        let modules =
            discover_modules(dir.path(), &BTreeSet::new(), &NameScheme::default()).unwrap();
        assert_eq!(names(&modules), vec!["cube", "snake"]);
    }

    #[test]
    fn test_plan_rejects_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        make_dirs(dir.path(), &["lobby", "assets"]);
        let err = plan_modules(&ForgeConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, ForgeError::NoModules(_)));
    }

    #[test]
    fn test_plan_rejects_collisions() {
        let dir = tempfile::tempdir().unwrap();
        make_dirs(dir.path(), &["block-blast", "blockBlast"]);
        let err = plan_modules(&ForgeConfig::default(), dir.path()).unwrap_err();
        assert!(matches!(err, ForgeError::NameCollision { .. }));
    }

    #[test]
    fn test_module_paths() {
        let root = Path::new("/p");
        let layout = Layout::new(root, &LayoutSection::default());
        let module = Module::new(root, "net_io", &NameScheme::default());
        assert_eq!(module.artifact_path(), Path::new("/p/net_io/build/lib/libnetio.a"));
        assert_eq!(module.header_source(), Path::new("/p/net_io/include/netioAPI.h"));
        assert_eq!(module.shared_library(&layout), Path::new("/p/build/lib/libnetio.a"));
        assert_eq!(
            module.shared_header(&layout),
            Path::new("/p/firstparty/APIs/netioAPI.h")
        );
    }
}
