use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use polars::prelude::{AnyValue, Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::values::{CellValue, parse_f64, parse_i64};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field separator.
    pub delimiter: u8,
    /// Rows sampled for type inference; `None` scans the whole column.
    /// A sampled type that does not hold for later rows is re-inferred.
    pub infer_schema_rows: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            infer_schema_rows: None,
        }
    }
}

/// A loaded CSV file: one polars frame plus where it came from.
#[derive(Debug, Clone)]
pub struct LocalTable {
    source: PathBuf,
    frame: DataFrame,
}

impl LocalTable {
    pub fn new(source: impl Into<PathBuf>, frame: DataFrame) -> Self {
        Self {
            source: source.into(),
            frame,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names_owned()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Every cell of a column, top to bottom.
    pub fn cells(&self, name: &str) -> Option<Vec<CellValue>> {
        let column = self.frame.column(name).ok()?;
        let cells = (0..self.frame.height())
            .map(|idx| CellValue::from(column.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        Some(cells)
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').to_string()
}

/// Header names plus every data record, checked for shape and encoding.
///
/// Blank lines are skipped; every other record must have the header's
/// field count.
fn read_records(path: &Path, options: &LoadOptions) -> Result<(Vec<String>, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .delimiter(options.delimiter)
        .from_path(path)
        .map_err(|err| IngestError::from_csv(path, err))?;
    let headers = reader
        .headers()
        .map_err(|err| IngestError::from_csv(path, err))?
        .clone();
    if headers.is_empty() {
        return Err(IngestError::MissingHeader {
            path: path.to_path_buf(),
        });
    }

    let mut seen = BTreeSet::new();
    let mut columns = Vec::with_capacity(headers.len());
    for (index, raw) in headers.iter().enumerate() {
        let name = normalize_header(raw);
        if name.trim().is_empty() {
            return Err(IngestError::EmptyHeader {
                path: path.to_path_buf(),
                index: index + 1,
            });
        }
        if !seen.insert(name.clone()) {
            return Err(IngestError::DuplicateColumn {
                path: path.to_path_buf(),
                name,
            });
        }
        columns.push(name);
    }

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| IngestError::from_csv(path, err))?;
    Ok((columns, records))
}

/// Column type inferred from the text of its non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn parse_bool(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl ColumnKind {
    fn accepts(self, value: &str) -> bool {
        match self {
            Self::Int => parse_i64(value).is_some(),
            Self::Float => parse_f64(value).is_some(),
            Self::Bool => parse_bool(value).is_some(),
            Self::Text => true,
        }
    }

    /// Narrowest kind every present value parses as; all-empty columns are text.
    fn infer<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let candidates = [Self::Int, Self::Float, Self::Bool];
        let mut alive = [true; 3];
        let mut any = false;
        for value in values.filter(|value| !value.trim().is_empty()) {
            any = true;
            for (kind, keep) in candidates.iter().zip(alive.iter_mut()) {
                *keep = *keep && kind.accepts(value);
            }
            if !alive.iter().any(|keep| *keep) {
                return Self::Text;
            }
        }
        if !any {
            return Self::Text;
        }
        candidates
            .into_iter()
            .zip(alive)
            .find_map(|(kind, keep)| keep.then_some(kind))
            .unwrap_or(Self::Text)
    }
}

fn build_column(
    name: &str,
    index: usize,
    records: &[StringRecord],
    sample: Option<usize>,
) -> Column {
    let values: Vec<&str> = records
        .iter()
        .map(|record| record.get(index).unwrap_or(""))
        .collect();
    let sampled = ColumnKind::infer(values.iter().take(sample.unwrap_or(usize::MAX)).copied());
    let kind = if values
        .iter()
        .all(|value| value.trim().is_empty() || sampled.accepts(value))
    {
        sampled
    } else {
        ColumnKind::infer(values.iter().copied())
    };

    let series = match kind {
        ColumnKind::Int => {
            let data: Vec<Option<i64>> = values.iter().map(|value| parse_i64(value)).collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Float => {
            let data: Vec<Option<f64>> = values.iter().map(|value| parse_f64(value)).collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Bool => {
            let data: Vec<Option<bool>> = values.iter().map(|value| parse_bool(value)).collect();
            Series::new(name.into(), data)
        }
        ColumnKind::Text => {
            let data: Vec<Option<&str>> = values
                .iter()
                .map(|value| (!value.is_empty()).then_some(*value))
                .collect();
            Series::new(name.into(), data)
        }
    };
    debug!(column = name, kind = ?kind, nulls = series.null_count(), "column typed");
    series.into_column()
}

/// Load a CSV file into a [`LocalTable`] with inferred column types.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<LocalTable> {
    if !path.is_file() {
        return Err(IngestError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    let (names, records) = read_records(path, options)?;
    debug!(
        path = %path.display(),
        columns = names.len(),
        rows = records.len(),
        "csv structure verified"
    );

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(index, name)| build_column(name, index, &records, options.infer_schema_rows))
        .collect();
    let frame = DataFrame::new(columns).map_err(|e| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    info!(
        path = %path.display(),
        rows = frame.height(),
        columns = frame.width(),
        "table loaded"
    );
    Ok(LocalTable::new(path, frame))
}
