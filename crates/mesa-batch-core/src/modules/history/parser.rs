use super::model::MesaTable;
use crate::common::parse_fortran_real;
use crate::domain::{BatchError, BatchResult};
use std::fs;
use std::path::Path;

const HEADER_NAMES_LINE: usize = 2;
const HEADER_VALUES_LINE: usize = 3;
const COLUMN_NAMES_LINE: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MesaTableError {
    #[error("table ends before line {line} ({what})")]
    Truncated { line: usize, what: &'static str },
    #[error("line {line}: {names} header names but {values} header values")]
    HeaderMismatch {
        line: usize,
        names: usize,
        values: usize,
    },
    #[error("line {line}: unterminated quoted header value")]
    UnterminatedQuote { line: usize },
    #[error("line {line}: expected {expected} fields, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: '{token}' is not a number")]
    NotANumber { line: usize, token: String },
}

pub fn read_mesa_table(path: &Path) -> BatchResult<MesaTable> {
    let text = fs::read_to_string(path).map_err(|source| {
        BatchError::io_system(
            "IO.MESA_TABLE",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    parse_mesa_table(&text).map_err(|error| {
        BatchError::parse(
            "PARSE.MESA_TABLE",
            format!("'{}': {}", path.display(), error),
        )
    })
}

pub fn parse_mesa_table(text: &str) -> Result<MesaTable, MesaTableError> {
    let lines: Vec<&str> = text.lines().collect();
    let line_at = |number: usize, what: &'static str| {
        lines
            .get(number - 1)
            .copied()
            .ok_or(MesaTableError::Truncated { line: number, what })
    };

    let names: Vec<&str> = line_at(HEADER_NAMES_LINE, "header names")?
        .split_whitespace()
        .collect();
    let values = tokenize_header_values(line_at(HEADER_VALUES_LINE, "header values")?)
        .ok_or(MesaTableError::UnterminatedQuote {
            line: HEADER_VALUES_LINE,
        })?;
    if names.len() != values.len() {
        return Err(MesaTableError::HeaderMismatch {
            line: HEADER_VALUES_LINE,
            names: names.len(),
            values: values.len(),
        });
    }

    let columns: Vec<String> = line_at(COLUMN_NAMES_LINE, "column names")?
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (offset, line) in lines.iter().enumerate().skip(COLUMN_NAMES_LINE) {
        let line_number = offset + 1;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != columns.len() {
            return Err(MesaTableError::RowWidth {
                line: line_number,
                expected: columns.len(),
                found: tokens.len(),
            });
        }
        let row = tokens
            .iter()
            .map(|token| {
                parse_fortran_real(token).ok_or_else(|| MesaTableError::NotANumber {
                    line: line_number,
                    token: (*token).to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    Ok(MesaTable {
        header: names
            .into_iter()
            .map(str::to_string)
            .zip(values)
            .collect(),
        columns,
        rows,
    })
}

/// Whitespace-separated tokens where a double-quoted string is one token (quotes dropped).
fn tokenize_header_values(line: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if ch == '"' {
            chars.next();
            let mut closed = false;
            for inner in chars.by_ref() {
                if inner == '"' {
                    closed = true;
                    break;
                }
                token.push(inner);
            }
            if !closed {
                return None;
            }
        } else {
            while let Some(&inner) = chars.peek() {
                if inner.is_whitespace() {
                    break;
                }
                token.push(inner);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Some(tokens)
}

#[cfg(test)]
mod tests {
    use super::{MesaTableError, parse_mesa_table, read_mesa_table};
    use crate::domain::BatchErrorCategory;
    use tempfile::TempDir;

    const HISTORY: &str = "\
                                         1                                         2                                         3
                            version_number                                  compiler                                 initial_z
                                \"r23.05.1\"                      \"gfortran 12.2\"                  2.0000000000000000D-02

                                         1                                         2                                         3                                         4
                              model_number                          star_age                         center_h1                      log_Teff
                                         1                   1.0000000000000000E+04               0.70000000000000000                3.6500000000000000
                                         2                   5.0000000000000000E+06                0.0005000000000000                3.9000000000000000
                                         3                   6.0000000000000000E+06   0.1000000000000000-100                3.8000000000000000
";

    #[test]
    fn header_and_columns_are_read() {
        let table = parse_mesa_table(HISTORY).expect("history should parse");
        assert_eq!(table.header_value("version_number"), Some("r23.05.1"));
        assert_eq!(table.header_value("compiler"), Some("gfortran 12.2"));
        assert_eq!(table.header_value("initial_z"), Some("2.0000000000000000D-02"));
        assert_eq!(table.columns().len(), 4);
        assert_eq!(table.len(), 3);
        assert_eq!(table.value(2, "center_h1"), Some(0.1e-100));
        assert_eq!(table.value(0, "star_age"), Some(1.0e4));
    }

    #[test]
    fn tams_is_first_row_with_exhausted_hydrogen() {
        let table = parse_mesa_table(HISTORY).expect("history should parse");
        assert_eq!(table.tams_row(), Some(1));
    }

    #[test]
    fn ragged_rows_name_their_line() {
        let broken = format!("{}  4 1.0 0.5\n", HISTORY);
        let error = parse_mesa_table(&broken).expect_err("short row should fail");
        assert_eq!(
            error,
            MesaTableError::RowWidth {
                line: 10,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn short_file_is_truncated() {
        let error = parse_mesa_table("a\nb\nc\n").expect_err("no column line");
        assert!(matches!(error, MesaTableError::Truncated { line: 6, .. }));
    }

    #[test]
    fn file_errors_name_the_table() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("history.data");
        std::fs::write(&path, "a\nb\nc\n").expect("table should be written");

        let error = read_mesa_table(&path).expect_err("truncated table");
        assert_eq!(error.category(), BatchErrorCategory::ParseError);
        assert_eq!(error.code(), "PARSE.MESA_TABLE");
        assert!(error.message().contains("history.data"), "{}", error.message());
    }
}
