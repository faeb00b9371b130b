use std::path::{Component, Path, PathBuf};

use crate::AssetError;

/// Maps site-absolute texture ids onto files under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `/assets/a.png` resolves to `<root>/assets/a.png`. Ids that are empty
    /// or climb out of the root are rejected.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(id.trim_start_matches('/'));
        let mut path = self.root.clone();
        let mut pushed = false;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    pushed = true;
                }
                Component::CurDir => {}
                _ => return Err(AssetError::InvalidId(id.to_string())),
            }
        }
        if !pushed {
            return Err(AssetError::InvalidId(id.to_string()));
        }
        Ok(path)
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(".")
    }
}
