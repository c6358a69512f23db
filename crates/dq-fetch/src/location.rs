use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

const GS_SCHEME: &str = "gs://";

/// A remote object, addressed by bucket and object path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub path: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Result<Self, FetchError> {
        let bucket = bucket.into();
        let path = path.into();
        let bucket = bucket.trim().trim_matches('/').to_string();
        let path = path.trim().trim_start_matches('/').to_string();
        if bucket.is_empty() || bucket.contains('/') {
            return Err(FetchError::InvalidLocation(format!(
                "bucket name {bucket:?} is empty or contains '/'"
            )));
        }
        if path.is_empty() || path.ends_with('/') {
            return Err(FetchError::InvalidLocation(format!(
                "object path {path:?} does not name an object"
            )));
        }
        Ok(Self { bucket, path })
    }
}

impl FromStr for ObjectLocation {
    type Err = FetchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let rest = raw
            .strip_prefix(GS_SCHEME)
            .ok_or_else(|| FetchError::InvalidLocation(format!("{raw} is not a gs:// URI")))?;
        let (bucket, path) = rest
            .split_once('/')
            .ok_or_else(|| FetchError::InvalidLocation(format!("{raw} has no object path")))?;
        Self::new(bucket, path)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GS_SCHEME}{}/{}", self.bucket, self.path)
    }
}
