pub mod csv_table;
pub mod error;
pub mod values;

pub use csv_table::{LoadOptions, LocalTable, load_csv};
pub use error::{IngestError, Result};
pub use values::{CellValue, format_numeric, parse_f64, parse_i64};
