//! Directory-backed object store.
//!
//! Each bucket is a directory under `root`; object paths are relative file
//! paths inside it. Used for offline runs and tests.

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{FetchError, Result};
use crate::location::ObjectLocation;
use crate::store::{FetchReport, ObjectStore, write_atomically};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location to a file under the root, refusing paths that escape it.
    pub fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf> {
        let relative = Path::new(&location.path);
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
        if escapes {
            return Err(FetchError::InvalidLocation(format!(
                "{location} must be a plain relative object path"
            )));
        }
        Ok(self.root.join(&location.bucket).join(relative))
    }
}

impl ObjectStore for LocalStore {
    fn fetch(&self, location: &ObjectLocation, destination: &Path) -> Result<FetchReport> {
        let source = self.object_path(location)?;
        debug!(source = %source.display(), "opening local object");
        let mut file = match File::open(&source) {
            Ok(file) if source.is_file() => file,
            Ok(_) => {
                return Err(FetchError::NotFound {
                    location: location.to_string(),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound {
                    location: location.to_string(),
                });
            }
            Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                return Err(FetchError::Unauthorized {
                    location: location.to_string(),
                    status: 403,
                });
            }
            Err(source) => {
                return Err(FetchError::Interrupted {
                    location: location.to_string(),
                    source,
                });
            }
        };
        write_atomically(&mut file, location, destination)
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
