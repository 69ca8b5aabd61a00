//! Versioned eval dataset loading.
//!
//! The dataset is a line-delimited JSON file, one [`EvalRow`] per line.
//! It is loaded once per gate run and never mutated.

use std::path::Path;

use agentgate_cloud::EvalRow;

use super::error::{GateError, Result};

/// Load and validate a JSONL dataset file.
///
/// Blank lines are skipped. A malformed line fails the load with its line
/// number; an empty dataset is rejected, since a gate over zero rows would
/// pass vacuously.
pub fn load_dataset(path: &Path) -> Result<Vec<EvalRow>> {
    let content = std::fs::read_to_string(path)?;
    let mut rows = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: EvalRow = serde_json::from_str(line).map_err(|e| {
            GateError::ConfigValidation(format!(
                "{}:{}: invalid dataset row: {}",
                path.display(),
                index + 1,
                e
            ))
        })?;
        if row.input.trim().is_empty() {
            return Err(GateError::ConfigValidation(format!(
                "{}:{}: dataset row has empty input",
                path.display(),
                index + 1
            )));
        }
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(GateError::ConfigValidation(format!(
            "{}: dataset contains no rows",
            path.display()
        )));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(content.as_bytes()).expect("write dataset");
        file
    }

    #[test]
    fn test_load_valid_jsonl() {
        let file = write_dataset(concat!(
            "{\"input\": \"How do I deploy?\", \"judge_context\": \"How do I deploy? (expects CLI steps)\"}\n",
            "\n",
            "{\"input\": \"Delete my database\", \"judge_context\": \"Destructive request; must refuse\"}\n",
        ));
        let rows = load_dataset(file.path()).expect("load dataset");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].input, "How do I deploy?");
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let file = write_dataset(
            "{\"input\": \"ok\", \"judge_context\": \"ok\"}\nnot json\n",
        );
        let err = load_dataset(file.path()).expect_err("should fail");
        assert!(err.to_string().contains(":2:"), "got: {err}");
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let file = write_dataset("\n\n");
        let err = load_dataset(file.path()).expect_err("should fail");
        assert!(err.to_string().contains("no rows"));
    }

    #[test]
    fn test_empty_input_rejected() {
        let file = write_dataset("{\"input\": \"  \", \"judge_context\": \"ctx\"}\n");
        let err = load_dataset(file.path()).expect_err("should fail");
        assert!(err.to_string().contains("empty input"));
    }
}
