use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use crate::cli::{BatchArgs, ScoreArgs};
use crate::infra::load_matrix;
use pretrial_dmf::config::AppConfig;
use pretrial_dmf::error::AppError;
use pretrial_dmf::workflows::assessment::{
    read_batch_path, AssessmentId, BatchRow, DmfEngine, EvaluationError, MalformedInput,
    ResponseSchema, ScoringResult, ValidationError,
};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// One output line of a batch run.
#[derive(Debug, Serialize)]
pub(crate) struct BatchLine<'a> {
    pub(crate) assessment_id: &'a AssessmentId,
    pub(crate) line: u64,
    #[serde(flatten)]
    pub(crate) outcome: BatchOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum BatchOutcome {
    Scored {
        result: ScoringResult,
    },
    Rejected {
        kind: &'static str,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rule_id: Option<String>,
    },
}

impl BatchOutcome {
    fn is_scored(&self) -> bool {
        matches!(self, BatchOutcome::Scored { .. })
    }
}

impl From<Result<ScoringResult, EvaluationError>> for BatchOutcome {
    fn from(outcome: Result<ScoringResult, EvaluationError>) -> Self {
        match outcome {
            Ok(result) => BatchOutcome::Scored { result },
            Err(err) => {
                let (kind, rule_id) = match &err {
                    EvaluationError::Type(_) => ("malformed_input", None),
                    EvaluationError::Validation(ValidationError::IllogicalCombination {
                        rule_id,
                    }) => ("illogical_combination", Some(rule_id.clone())),
                    EvaluationError::Configuration(_) => ("configuration", None),
                };
                BatchOutcome::Rejected {
                    kind,
                    error: err.to_string(),
                    rule_id,
                }
            }
        }
    }
}

/// Evaluate rows in parallel against one shared engine. Output order follows input order.
pub(crate) fn score_rows<'a>(
    engine: &DmfEngine,
    schema: &ResponseSchema,
    rows: &'a [BatchRow],
) -> Vec<BatchLine<'a>> {
    rows.par_iter()
        .map(|row| BatchLine {
            assessment_id: &row.assessment_id,
            line: row.line,
            outcome: engine.assess(&row.responses, schema).into(),
        })
        .collect()
}

pub(crate) fn run_batch(args: BatchArgs, config: &AppConfig) -> Result<(), AppError> {
    let engine = DmfEngine::new(load_matrix(args.matrix, &config.matrix)?);
    let schema = ResponseSchema::standard();
    let rows = read_batch_path(&args.input)?;

    let lines = score_rows(&engine, &schema, &rows);
    let scored = lines.iter().filter(|line| line.outcome.is_scored()).count();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for line in &lines {
        serde_json::to_writer(&mut out, line)?;
        writeln!(out)?;
    }
    out.flush()?;

    info!(
        input = %args.input.display(),
        rows = lines.len(),
        scored,
        rejected = lines.len() - scored,
        "batch complete"
    );
    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs, config: &AppConfig) -> Result<(), AppError> {
    let engine = DmfEngine::new(load_matrix(args.matrix, &config.matrix)?);
    let document: Value = serde_json::from_reader(BufReader::new(File::open(&args.responses)?))?;
    let Value::Object(raw) = document else {
        return Err(EvaluationError::from(MalformedInput::NotAnObject).into());
    };

    let result = engine.assess(&raw, &ResponseSchema::standard())?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
