use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

use crate::error::{CheckpointError, Result};

/// Render a strftime run-name template at `now`.
pub fn render_run_name(template: &str, now: DateTime<Utc>) -> Result<String> {
    let invalid = || CheckpointError::RunNameTemplate {
        template: template.to_string(),
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut name = String::new();
    write!(name, "{}", now.format_with_items(items.iter())).map_err(|_| invalid())?;
    if name.trim().is_empty() {
        return Err(invalid());
    }
    Ok(name)
}
