//! Module name normalization.
//!
//! A module directory name maps to a canonical library name by lower-casing and
//! dropping `_` and `-`. Every other artifact name derives from that library name:
//!
//! | Directory        | Library         | Archive               | API header              |
//! |------------------|-----------------|-----------------------|-------------------------|
//! | `Audio`          | `audio`         | `libaudio.a`          | `audioAPI.h`            |
//! | `Physics-Engine` | `physicsengine` | `libphysicsengine.a`  | `physicsengineAPI.h`    |
//! | `net_io`         | `netio`         | `libnetio.a`          | `netioAPI.h`            |

use crate::discovery::Module;
use crate::error::{ForgeError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

const SEPARATORS: [char; 2] = ['_', '-'];

/// Canonical library name for a module directory.
pub fn library_name(dir_name: &str) -> String {
    dir_name
        .chars()
        .filter(|c| !SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// File naming conventions derived from a library name.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NameScheme {
    pub header_ext: String,
    pub archive_prefix: String,
    pub archive_ext: String,
}

impl Default for NameScheme {
    fn default() -> Self {
        Self {
            header_ext: "h".to_string(),
            archive_prefix: "lib".to_string(),
            archive_ext: "a".to_string(),
        }
    }
}

impl NameScheme {
    pub fn header_name(&self, library: &str) -> String {
        format!("{}API.{}", library, self.header_ext)
    }

    pub fn archive_name(&self, library: &str) -> String {
        format!("{}{}.{}", self.archive_prefix, library, self.archive_ext)
    }
}

/// Fails if two modules would share a library name, or if a name normalizes to nothing.
pub fn check_collisions(modules: &[Module]) -> Result<()> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for module in modules {
        if module.library.is_empty() {
            return Err(ForgeError::InvalidModuleName(module.name.clone()));
        }
        if let Some(first) = seen.insert(&module.library, &module.name) {
            return Err(ForgeError::NameCollision {
                library: module.library.clone(),
                first: first.to_string(),
                second: module.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_library_name_examples() {
        assert_eq!(library_name("Audio"), "audio");
        assert_eq!(library_name("Physics-Engine"), "physicsengine");
        assert_eq!(library_name("net_io"), "netio");
        assert_eq!(library_name("king_for_four"), "kingforfour");
        assert_eq!(library_name("Crazy_8"), "crazy8");
    }

    #[test]
    fn test_library_name_is_deterministic() {
        for name in ["block-blast", "blockBlast", "Othello3D", "tui-ver"] {
            assert_eq!(library_name(name), library_name(name));
        }
    }

    #[test]
    fn test_only_underscore_and_hyphen_are_stripped() {
        assert_eq!(library_name("a.b c"), "a.b c");
        assert_eq!(library_name("__--"), "");
    }

    #[test]
    fn test_header_and_archive_names() {
        let scheme = NameScheme::default();
        assert_eq!(scheme.header_name("audio"), "audioAPI.h");
        assert_eq!(scheme.archive_name("netio"), "libnetio.a");

        let hpp = NameScheme {
            header_ext: "hpp".into(),
            ..NameScheme::default()
        };
        assert_eq!(hpp.header_name("audio"), "audioAPI.hpp");
    }

    #[test]
    fn test_collision_detected() {
        let scheme = NameScheme::default();
        let root = Path::new("/project");
        let modules = vec![
            Module::new(root, "block-blast", &scheme),
            Module::new(root, "blockBlast", &scheme),
        ];
        match check_collisions(&modules) {
            Err(ForgeError::NameCollision {
                library,
                first,
                second,
            }) => {
                assert_eq!(library, "blockblast");
                assert_eq!(first, "block-blast");
                assert_eq!(second, "blockBlast");
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_library_name_rejected() {
        let scheme = NameScheme::default();
        let modules = vec![Module::new(Path::new("/p"), "_-_", &scheme)];
        assert!(matches!(
            check_collisions(&modules),
            Err(ForgeError::InvalidModuleName(name)) if name == "_-_"
        ));
    }

    #[test]
    fn test_distinct_names_pass() {
        let scheme = NameScheme::default();
        let root = Path::new("/p");
        let modules: Vec<_> = ["Audio", "Physics-Engine", "net_io"]
            .iter()
            .map(|n| Module::new(root, n, &scheme))
            .collect();
        assert!(check_collisions(&modules).is_ok());
    }
}
