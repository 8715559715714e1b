use super::model::{PARAMETER_FIELDS, ParameterRow, ParameterTable, SkippedRow};
use crate::common::parse_decimal;
use crate::domain::{BatchError, BatchResult, OvershootScheme, RunConfig};
use crate::modules::report::ItemFailure;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ParameterTableError {
    #[error("failed to open parameter table '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed parameter table near row {row}: {source}")]
    Csv { row: usize, source: csv::Error },
}

impl From<ParameterTableError> for BatchError {
    fn from(error: ParameterTableError) -> Self {
        match &error {
            ParameterTableError::Open { .. } => {
                BatchError::io_system("IO.PARAMETER_TABLE", error.to_string())
            }
            ParameterTableError::Csv { .. } => {
                BatchError::parse("PARSE.PARAMETER_TABLE", error.to_string())
            }
        }
    }
}

pub fn load_parameter_table(path: &Path) -> BatchResult<ParameterTable> {
    let file = File::open(path).map_err(|source| ParameterTableError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_parameter_table(file)?;
    tracing::debug!(
        path = %path.display(),
        rows = table.rows.len(),
        skipped = table.skipped.len(),
        invalid = table.invalid.len(),
        "loaded parameter table"
    );
    Ok(table)
}

pub fn parse_parameter_table<R: Read>(reader: R) -> BatchResult<ParameterTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut table = ParameterTable::default();
    for (index, result) in csv_reader.records().enumerate() {
        let row = index + 2;
        let record = result.map_err(|source| ParameterTableError::Csv { row, source })?;
        let fields: Vec<&str> = record.iter().collect();

        if let Some(reason) = skip_reason(&fields) {
            tracing::warn!(row, "skipping parameter row: {}", reason);
            table.skipped.push(SkippedRow { row, reason });
            continue;
        }

        match parse_row(&fields) {
            Ok(config) => table.rows.push(ParameterRow {
                row,
                name: fields[0].to_string(),
                config,
            }),
            Err(error) => table
                .invalid
                .push(ItemFailure::record(format!("row {}", row), &error)),
        }
    }
    Ok(table)
}

fn skip_reason(fields: &[&str]) -> Option<String> {
    if fields.len() < PARAMETER_FIELDS {
        return Some(format!(
            "has {} fields, expected {}",
            fields.len(),
            PARAMETER_FIELDS
        ));
    }
    if fields[1].is_empty() || fields[2].is_empty() {
        return Some("mass or metallicity is blank".to_string());
    }
    None
}

fn parse_row(fields: &[&str]) -> BatchResult<RunConfig> {
    let mass = decimal_field("mass", fields[1])?;
    let metallicity = decimal_field("metallicity", fields[2])?;
    if fields[3].is_empty() {
        return Err(BatchError::missing_field(
            "MISSING.TABLE_SCHEME",
            "overshoot scheme is blank",
        ));
    }

    let scheme = OvershootScheme::from_label(fields[3]);
    if scheme.is_none() {
        return RunConfig::without_overshoot(mass, metallicity);
    }

    let f_ov = strength_field("f_ov", fields[4])?;
    let f0 = strength_field("f0", fields[5])?;
    RunConfig::new(mass, metallicity, scheme, f_ov, f0)
}

fn decimal_field(field: &str, text: &str) -> BatchResult<f64> {
    parse_decimal(text).ok_or_else(|| {
        BatchError::parse(
            "PARSE.TABLE_DECIMAL",
            format!("{} '{}' is not a decimal number", field, text),
        )
    })
}

fn strength_field(field: &str, text: &str) -> BatchResult<f64> {
    if text.is_empty() {
        return Err(BatchError::missing_field(
            "MISSING.TABLE_STRENGTH",
            format!("{} is blank but an overshoot scheme is set", field),
        ));
    }
    decimal_field(field, text)
}

#[cfg(test)]
mod tests {
    use super::parse_parameter_table;
    use crate::domain::OvershootScheme;

    const TABLE: &str = "\
name,mass,metallicity,scheme,fov,f0
alice,5,0.014,exponential,0.02,0.005
bob,15,0.02,No Overshooting,,
carol,3
dave,,0.02,step,0.1,0
erin,2.5,0.001,step,0.1,
frank,-1,0.02,none,,
";

    #[test]
    fn rows_are_parsed_skipped_or_rejected() {
        let table = parse_parameter_table(TABLE.as_bytes()).expect("table should parse");

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].row, 2);
        assert_eq!(table.rows[0].name, "alice");
        assert_eq!(table.rows[0].config.scheme, OvershootScheme::Exponential);
        assert_eq!(table.rows[0].config.f0, 0.005);
        assert_eq!(table.rows[1].config.scheme, OvershootScheme::None);
        assert_eq!(table.rows[1].config.f_ov, 0.0);

        let skipped: Vec<usize> = table.skipped.iter().map(|row| row.row).collect();
        assert_eq!(skipped, [4, 5]);

        let invalid: Vec<(&str, &str)> = table
            .invalid
            .iter()
            .map(|failure| (failure.item.as_str(), failure.code.as_str()))
            .collect();
        assert_eq!(
            invalid,
            [("row 6", "MISSING.TABLE_STRENGTH"), ("row 7", "VALIDATION.MASS")]
        );
    }

    #[test]
    fn header_only_table_is_empty() {
        let table = parse_parameter_table("name,mass,metallicity,scheme,fov,f0\n".as_bytes())
            .expect("table should parse");
        assert!(table.is_empty());
        assert!(table.skipped.is_empty());
    }
}
