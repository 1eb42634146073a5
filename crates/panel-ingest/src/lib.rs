//! Wide survey table ingestion.

pub mod error;
pub mod polars_utils;
pub mod reader;

pub use error::{IngestError, Result};
pub use polars_utils::{any_to_f64, any_to_string, format_numeric, is_missing, parse_f64};
pub use reader::{
    IngestOptions, MAX_CSV_FILE_SIZE, check_file_size, read_wide_csv, validate_dataframe_shape,
    validate_encoding,
};
