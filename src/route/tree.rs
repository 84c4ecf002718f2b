//! Version → Module → Controller → Action registry.
//!
//! # Responsibilities
//! - Map a controller's source file onto a version and module
//! - Keep insertion order at every level
//! - Convert names to URL segments (snake case, default version elided)
//!
//! # Design Decisions
//! - Paths are compared as `/`-separated strings so `file!()` output and
//!   Windows-style separators behave the same
//! - Only the version segment is ever elided; modules always appear

use std::path::{Path, PathBuf};

use super::ControllerEntry;
use crate::naming::camel_to_snake;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("{path} is not under the project root {root}")]
    OutsideRoot { path: String, root: String },

    #[error("{path} is fewer than two directories below the project root")]
    TooShallow { path: String },
}

#[derive(Debug)]
pub struct RouteTree {
    root: String,
    default_version: String,
    versions: Vec<Version>,
}

#[derive(Debug)]
pub struct Version {
    pub name: String,
    elided: bool,
    pub modules: Vec<Module>,
}

impl Version {
    /// URL segment; empty for the default version.
    pub fn path(&self) -> String {
        if self.elided {
            String::new()
        } else {
            camel_to_snake(&self.name)
        }
    }
}

#[derive(Debug)]
pub struct Module {
    pub name: String,
    /// Directory the module was derived from.
    pub absolute_path: PathBuf,
    pub controllers: Vec<ControllerEntry>,
}

impl Module {
    pub fn path(&self) -> String {
        camel_to_snake(&self.name)
    }
}

fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let trimmed = unified.trim_start_matches("./");
    trimmed.trim_end_matches('/').to_string()
}

impl RouteTree {
    pub fn new(root: impl AsRef<Path>, default_version: impl Into<String>) -> Self {
        Self {
            root: normalize(&root.as_ref().to_string_lossy()),
            default_version: default_version.into(),
            versions: Vec::new(),
        }
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    /// Version and module names for `source`, without touching the tree.
    pub fn derive(&self, source: &Path) -> Result<(String, String), TreeError> {
        let path = normalize(&source.to_string_lossy());
        let relative = if self.root.is_empty() || self.root == "." {
            Some(path.as_str())
        } else {
            path.strip_prefix(&self.root)
                .and_then(|rest| rest.strip_prefix('/'))
                .or_else(|| {
                    // Absolute source paths: match the root as a directory run.
                    let needle = format!("/{}/", self.root);
                    path.find(&needle).map(|at| &path[at + needle.len()..])
                })
        };
        let relative = relative.ok_or_else(|| TreeError::OutsideRoot {
            path: path.clone(),
            root: self.root.clone(),
        })?;

        let mut dirs: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        // The last segment is the file itself.
        dirs.pop();
        match dirs.as_slice() {
            [version, module, ..] => Ok((version.to_string(), module.to_string())),
            _ => Err(TreeError::TooShallow { path: path.clone() }),
        }
    }

    /// The module for `source`, created on first use.
    pub fn module_for(&mut self, source: &Path) -> Result<&mut Module, TreeError> {
        let (version_name, module_name) = self.derive(source)?;

        let version_at = match self.versions.iter().position(|v| v.name == version_name) {
            Some(at) => at,
            None => {
                self.versions.push(Version {
                    elided: version_name == self.default_version,
                    name: version_name.clone(),
                    modules: Vec::new(),
                });
                self.versions.len() - 1
            }
        };

        let root = PathBuf::from(&self.root);
        let version = &mut self.versions[version_at];
        let module_at = match version.modules.iter().position(|m| m.name == module_name) {
            Some(at) => at,
            None => {
                version.modules.push(Module {
                    absolute_path: root.join(&version_name).join(&module_name),
                    name: module_name,
                    controllers: Vec::new(),
                });
                version.modules.len() - 1
            }
        };
        Ok(&mut version.modules[module_at])
    }
}
