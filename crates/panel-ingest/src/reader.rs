//! Wide CSV loading.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use polars::prelude::*;

use crate::error::{IngestError, Result};

/// Maximum file size for CSV loading (4 GB default).
///
/// Public-use panel extracts routinely run to a few gigabytes.
pub const MAX_CSV_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Options controlling how a wide table is read.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Reject files larger than this many bytes.
    pub max_file_size: u64,
    /// Infer column dtypes instead of reading every cell as text.
    ///
    /// Off by default: inference turns zero-padded identifiers and codes
    /// such as `010` into integers and drops the padding.
    pub infer_dtypes: bool,
    /// Rows sampled for dtype inference when `infer_dtypes` is set.
    pub infer_schema_length: usize,
    /// Cell values read as missing in addition to empty cells (e.g. SAS `.`).
    pub null_values: Vec<String>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_file_size: MAX_CSV_FILE_SIZE,
            infer_dtypes: false,
            infer_schema_length: 1000,
            null_values: vec![".".to_string()],
        }
    }
}

fn open_error(path: &Path, error: std::io::Error) -> IngestError {
    if error.kind() == std::io::ErrorKind::NotFound {
        IngestError::FileNotFound {
            path: path.to_path_buf(),
        }
    } else {
        IngestError::FileRead {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

/// Check file size against a limit.
pub fn check_file_size(path: &Path, max_size: u64) -> Result<u64> {
    let metadata = std::fs::metadata(path).map_err(|e| open_error(path, e))?;
    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }
    Ok(metadata.len())
}

/// Validate the file is UTF-8 (a UTF-8 BOM is accepted, UTF-16 is not).
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| open_error(path, e))?;
    let mut buffer = [0u8; 4];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read >= 2 {
        if buffer[0..2] == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer[0..2] == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }
    Ok(())
}

/// Validate DataFrame shape after loading.
pub fn validate_dataframe_shape(df: &DataFrame, path: &Path) -> Result<()> {
    if df.height() == 0 {
        return Err(IngestError::EmptyTable {
            path: path.to_path_buf(),
        });
    }
    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Read a wide survey table from CSV.
///
/// Empty cells and any of `options.null_values` become nulls, which the
/// engine treats as the missing marker. Every other cell is kept verbatim as
/// a string unless `options.infer_dtypes` is set.
pub fn read_wide_csv(path: &Path, options: &IngestOptions) -> Result<DataFrame> {
    let size = check_file_size(path, options.max_file_size)?;
    validate_encoding(path)?;

    let null_values: Vec<PlSmallStr> = options
        .null_values
        .iter()
        .map(|value| PlSmallStr::from(value.as_str()))
        .collect();
    let null_values = if null_values.is_empty() {
        None
    } else {
        Some(NullValues::AllColumns(null_values))
    };

    // A zero-row inference window reads every column as String.
    let infer_schema_length = if options.infer_dtypes {
        options.infer_schema_length
    } else {
        0
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(infer_schema_length))
        .map_parse_options(|parse| parse.with_null_values(null_values.clone()))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_dataframe_shape(&df, path)?;
    tracing::info!(
        path = %path.display(),
        bytes = size,
        rows = df.height(),
        columns = df.width(),
        "wide table loaded"
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_read_wide_csv() {
        let file = create_temp_csv("hhidpn,r1shlt,r2shlt\n1,3,\n2,.,4\n");
        let df = read_wide_csv(file.path(), &IngestOptions::default()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let r1 = df.column("r1shlt").unwrap();
        assert_eq!(r1.null_count(), 1);
        let r2 = df.column("r2shlt").unwrap();
        assert_eq!(r2.null_count(), 1);
    }

    #[test]
    fn test_keeps_zero_padded_values() {
        let file = create_temp_csv("hhidpn,racode,r1shlt\n010,07,2\n10,08,3\n");
        let df = read_wide_csv(file.path(), &IngestOptions::default()).unwrap();

        let id = df.column("hhidpn").unwrap();
        assert_eq!(id.dtype(), &DataType::String);
        assert_eq!(id.get(0).unwrap(), AnyValue::String("010"));
        assert_eq!(id.get(1).unwrap(), AnyValue::String("10"));
        let code = df.column("racode").unwrap();
        assert_eq!(code.get(0).unwrap(), AnyValue::String("07"));
    }

    #[test]
    fn test_infers_dtypes_when_asked() {
        let file = create_temp_csv("hhidpn,r1shlt\n010,2\n");
        let options = IngestOptions {
            infer_dtypes: true,
            ..IngestOptions::default()
        };
        let df = read_wide_csv(file.path(), &options).unwrap();
        assert_eq!(df.column("hhidpn").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn test_rejects_oversized_file() {
        let file = create_temp_csv("hhidpn\n1\n");
        let options = IngestOptions {
            max_file_size: 2,
            ..IngestOptions::default()
        };
        let result = read_wide_csv(file.path(), &options);
        assert!(matches!(result, Err(IngestError::FileTooLarge { .. })));
    }

    #[test]
    fn test_rejects_utf16() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xFE, b'a', 0]).unwrap();
        let result = validate_encoding(file.path());
        assert!(matches!(
            result,
            Err(IngestError::UnsupportedEncoding {
                encoding: "UTF-16 LE",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_header_only_file() {
        let file = create_temp_csv("hhidpn,r1shlt\n");
        let result = read_wide_csv(file.path(), &IngestOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = read_wide_csv(
            Path::new("/definitely/not/here.csv"),
            &IngestOptions::default(),
        );
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }
}
