//! Conversion of the provider's delimited text files into [`WeatherRow`]s.
//!
//! The first record is the header. Every following record becomes one row keyed by
//! header name; cells are parsed individually, so a column may mix numbers and text.

use crate::types::record::{CellValue, WeatherRow};
use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

/// Separator used by the provider's climatological files.
pub const DEFAULT_DELIMITER: u8 = b';';

#[derive(Debug, Error)]
pub enum TableError {
    #[error("File has no header row")]
    MissingHeader,

    #[error("Failed to read delimited file")]
    Read(#[from] csv::Error),
}

/// Parses `text` into rows.
///
/// Blank lines are skipped. Cells beyond the header width are dropped and short
/// records only carry the columns they have. A header with no data rows yields no
/// rows; a file without any header is an error.
pub fn parse_table(text: &str, delimiter: u8) -> Result<Vec<WeatherRow>, TableError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(text.as_bytes());

    let header = reader.headers()?.clone();
    if is_blank(&header) {
        return Err(TableError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if is_blank(&record) {
            continue;
        }
        rows.push(WeatherRow::new(
            header
                .iter()
                .zip(record.iter())
                .map(|(name, cell)| (name.to_string(), parse_cell(cell)))
                .collect(),
        ));
    }
    Ok(rows)
}

/// Parses a single cell: blank => [`CellValue::Missing`], numeric (after turning a
/// decimal comma into a point) => [`CellValue::Number`], otherwise the trimmed text.
pub fn parse_cell(cell: &str) -> CellValue {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return CellValue::Missing;
    }
    match trimmed.replace(',', ".").parse::<f64>() {
        // "nan" and "inf" parse as floats but are labels in these files
        Ok(number) if number.is_finite() => CellValue::Number(number),
        _ => CellValue::Text(trimmed.to_string()),
    }
}

/// A whitespace-only line reads as a single blank field.
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "POSTE;DATE;T;RR1;QT\n\
                          20004002;2024030100;12,5;;1\n\
                          20004002;2024030101;11,9;0,2;9\n";

    #[test]
    fn record_count_is_lines_minus_header() -> Result<(), TableError> {
        let rows = parse_table(SAMPLE, DEFAULT_DELIMITER)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].columns().collect::<Vec<_>>(),
            ["POSTE", "DATE", "T", "RR1", "QT"]
        );
        Ok(())
    }

    #[test]
    fn parses_decimal_comma_blank_and_text_cells() {
        assert_eq!(parse_cell("12,5"), CellValue::Number(12.5));
        assert_eq!(parse_cell("-0.4"), CellValue::Number(-0.4));
        assert_eq!(parse_cell(""), CellValue::Missing);
        assert_eq!(parse_cell("   "), CellValue::Missing);
        assert_eq!(parse_cell("AJACCIO"), CellValue::Text("AJACCIO".to_string()));
        assert_eq!(parse_cell("1,2,3"), CellValue::Text("1,2,3".to_string()));
        assert_eq!(parse_cell("nan"), CellValue::Text("nan".to_string()));
    }

    #[test]
    fn row_cells_follow_header() -> Result<(), TableError> {
        let rows = parse_table(SAMPLE, DEFAULT_DELIMITER)?;
        assert_eq!(rows[0].get("T"), Some(&CellValue::Number(12.5)));
        assert_eq!(rows[0].get("RR1"), Some(&CellValue::Missing));
        assert_eq!(rows[1].get("RR1"), Some(&CellValue::Number(0.2)));
        Ok(())
    }

    #[test]
    fn header_only_yields_no_rows() -> Result<(), TableError> {
        assert!(parse_table("POSTE;DATE\n", DEFAULT_DELIMITER)?.is_empty());
        Ok(())
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            parse_table("", DEFAULT_DELIMITER),
            Err(TableError::MissingHeader)
        ));
        assert!(matches!(
            parse_table("  \n", DEFAULT_DELIMITER),
            Err(TableError::MissingHeader)
        ));
    }

    #[test]
    fn handles_crlf_missing_final_newline_and_blank_lines() -> Result<(), TableError> {
        let text = "A;B\r\n1;2\r\n\r\n   \r\n3;4";
        let rows = parse_table(text, DEFAULT_DELIMITER)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("B"), Some(&CellValue::Number(4.0)));
        Ok(())
    }

    #[test]
    fn quoted_cells_keep_delimiters() -> Result<(), TableError> {
        let text = "NOM;T\n\"CAP; CORSE\";\"3,5\"\n";
        let rows = parse_table(text, DEFAULT_DELIMITER)?;
        assert_eq!(
            rows[0].get("NOM"),
            Some(&CellValue::Text("CAP; CORSE".to_string()))
        );
        assert_eq!(rows[0].get("T"), Some(&CellValue::Number(3.5)));
        Ok(())
    }

    #[test]
    fn ragged_rows_are_truncated_to_available_cells() -> Result<(), TableError> {
        let rows = parse_table("A;B;C\n1;2\n1;2;3;4\n", DEFAULT_DELIMITER)?;
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 3);
        Ok(())
    }

    #[test]
    fn twenty_four_hourly_rows() -> Result<(), TableError> {
        let mut text = String::from("POSTE;DATE;T\n");
        for hour in 0..24 {
            text.push_str(&format!("20004002;20240301{hour:02};{hour},5\n"));
        }
        let rows = parse_table(&text, DEFAULT_DELIMITER)?;
        assert_eq!(rows.len(), 24);
        assert_eq!(rows[23].get("T"), Some(&CellValue::Number(23.5)));
        Ok(())
    }
}
