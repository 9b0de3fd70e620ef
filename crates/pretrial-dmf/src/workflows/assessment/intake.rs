use std::io::Read;
use std::path::Path;

use serde_json::Value;

use super::domain::{AssessmentId, RawResponses};

pub const ASSESSMENT_ID_COLUMN: &str = "assessmentId";

/// One CSV row: the assessment identifier plus its untyped responses.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub line: u64,
    pub assessment_id: AssessmentId,
    pub responses: RawResponses,
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("failed to read batch input: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid batch CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("batch CSV is missing the `assessmentId` column")]
    MissingIdColumn,
    #[error("row {line} has an empty `assessmentId`")]
    EmptyAssessmentId { line: u64 },
}

pub fn read_batch_path<P: AsRef<Path>>(path: P) -> Result<Vec<BatchRow>, BatchError> {
    let file = std::fs::File::open(path)?;
    read_batch(file)
}

/// Parse rows keyed by header. Cells stay strings; empty cells are dropped so the schema
/// check reports them as missing.
pub fn read_batch<R: Read>(reader: R) -> Result<Vec<BatchRow>, BatchError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let id_index = headers
        .iter()
        .position(|header| header == ASSESSMENT_ID_COLUMN)
        .ok_or(BatchError::MissingIdColumn)?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();

        let assessment_id = record.get(id_index).unwrap_or_default();
        if assessment_id.is_empty() {
            return Err(BatchError::EmptyAssessmentId { line });
        }

        let responses = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(index, (_, cell))| *index != id_index && !cell.is_empty())
            .map(|(_, (header, cell))| (header.to_string(), Value::String(cell.to_string())))
            .collect();

        rows.push(BatchRow {
            line,
            assessment_id: AssessmentId(assessment_id.to_string()),
            responses,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "assessmentId,ageBracket,pendingCharge,priorFTARecentCount";

    #[test]
    fn rows_keep_cells_as_strings() {
        let input = format!("{HEADER}\ncase-1, 2 ,true,4\n");
        let rows = read_batch(Cursor::new(input)).expect("batch parses");

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.assessment_id, AssessmentId("case-1".to_string()));
        assert_eq!(row.line, 2);
        assert_eq!(row.responses.get("ageBracket"), Some(&Value::from("2")));
        assert_eq!(row.responses.get("priorFTARecentCount"), Some(&Value::from("4")));
        assert!(!row.responses.contains_key(ASSESSMENT_ID_COLUMN));
    }

    #[test]
    fn empty_cells_are_left_out() {
        let input = format!("{HEADER}\ncase-2,1,,0\n");
        let rows = read_batch(Cursor::new(input)).expect("batch parses");

        assert!(!rows[0].responses.contains_key("pendingCharge"));
    }

    #[test]
    fn id_column_is_required() {
        let input = "ageBracket,pendingCharge\n1,false\n";
        assert!(matches!(
            read_batch(Cursor::new(input)),
            Err(BatchError::MissingIdColumn)
        ));

        let input = format!("{HEADER}\n,1,false,0\n");
        assert!(matches!(
            read_batch(Cursor::new(input)),
            Err(BatchError::EmptyAssessmentId { line: 2 })
        ));
    }
}
