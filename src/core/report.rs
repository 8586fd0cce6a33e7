use crate::core::sql::Transition;
use crate::domain::model::{GtinCount, SqlBatchResult};
use crate::utils::error::{MarkError, Result};
use chrono::{DateTime, Utc};

/// Renders a SQL script: a comment header followed by one statement per line.
pub fn sql_script(result: &SqlBatchResult, transition: Transition, generated_at: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("-- transition: {}", transition),
        format!("-- generated at: {}", generated_at.to_rfc3339()),
        format!(
            "-- input: {}, processed: {}, skipped: {}",
            result.total_input, result.processed, result.skipped
        ),
    ];
    lines.extend(result.statements.iter().cloned());

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

pub fn gtin_counts_csv(counts: &[GtinCount]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for count in counts {
        writer.serialize(count)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| MarkError::IoError(e.into_error()))?;

    String::from_utf8(bytes).map_err(|e| MarkError::parse(format!("CSV output is not UTF-8: {}", e)))
}

/// File name stamp, e.g. `20251014_093000`.
pub fn file_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

pub fn sql_file_name(transition: Transition, at: DateTime<Utc>) -> String {
    format!("marks_{}_{}.sql", transition.as_str().replace('-', "_"), file_stamp(at))
}
