use std::fs;
use std::path::Path;

use dq_model::RunStatus;
use tracing::debug;

use crate::error::{ReportError, Result};

/// Write the one-line run status consumed by schedulers and CI steps.
pub fn write_status_file(path: &Path, status: RunStatus) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    fs::write(path, status.as_str()).map_err(|e| ReportError::io(path, e))?;
    debug!(path = %path.display(), status = status.as_str(), "status file written");
    Ok(())
}

pub fn read_status_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|text| text.trim().to_string())
        .map_err(|e| ReportError::io(path, e))
}
