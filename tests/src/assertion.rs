//! Assertion types and builders for verifying step results.

use canopy_query::QueryError;
use serde_json::Value as Json;

use crate::error::{ScenarioError, ScenarioResult};

/// A complete assertion for a step result.
#[derive(Debug, Default)]
pub struct Assertion {
    // Shape
    pub null: bool,
    pub rows: Option<usize>,

    // Content
    pub returns: Option<Json>,
    pub first: Option<Json>,
    pub column: Option<(String, Vec<Json>)>,

    // Errors
    pub error: Option<String>,
    pub error_pattern: Option<String>,
    pub caller_error: Option<bool>,
}

impl Assertion {
    /// Create a new empty assertion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect a null result (single-resource query for a missing id).
    pub fn null(mut self) -> Self {
        self.null = true;
        self
    }

    /// Expect an array result with `count` rows.
    pub fn rows(mut self, count: usize) -> Self {
        self.rows = Some(count);
        self
    }

    /// Expect exactly this result.
    pub fn returns(mut self, expected: Json) -> Self {
        self.returns = Some(expected);
        self
    }

    /// Expect the first row (or the single row) to contain these entries.
    pub fn first(mut self, expected: Json) -> Self {
        self.first = Some(expected);
        self
    }

    /// Expect one key of every row, in order.
    pub fn column(mut self, key: impl Into<String>, values: Vec<Json>) -> Self {
        self.column = Some((key.into(), values));
        self
    }

    /// Expect an error whose message contains `text`.
    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.error = Some(text.into());
        self
    }

    /// Expect an error whose message matches a regex.
    pub fn error_matching(mut self, pattern: impl Into<String>) -> Self {
        self.error_pattern = Some(pattern.into());
        self
    }

    /// Expect a caller error (raised before execution).
    pub fn caller_error(mut self) -> Self {
        self.caller_error = Some(true);
        self
    }

    /// Expect a data consistency error.
    pub fn data_error(mut self) -> Self {
        self.caller_error = Some(false);
        self
    }

    fn expects_error(&self) -> bool {
        self.error.is_some() || self.error_pattern.is_some() || self.caller_error.is_some()
    }

    /// Verify the assertion against a result.
    pub fn verify(&self, step: &str, result: &Result<Json, QueryError>) -> ScenarioResult<()> {
        match result {
            Err(err) if self.expects_error() => self.verify_error(step, err),
            Err(err) => Err(ScenarioError::assertion_failed(
                step,
                format!("step failed: {}", err),
            )),
            Ok(value) if self.expects_error() => Err(ScenarioError::assertion_failed(
                step,
                format!("expected an error, but step returned {}", value),
            )),
            Ok(value) => self.verify_value(step, value),
        }
    }

    fn verify_error(&self, step: &str, err: &QueryError) -> ScenarioResult<()> {
        let message = err.to_string();

        if let Some(expected) = &self.error {
            if !message.contains(expected.as_str()) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error containing '{}', got: {}", expected, message),
                ));
            }
        }

        if let Some(pattern) = &self.error_pattern {
            let re = regex_lite::Regex::new(pattern).map_err(|e| {
                ScenarioError::assertion_failed(step, format!("invalid regex pattern: {}", e))
            })?;
            if !re.is_match(&message) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected error matching '{}', got: {}", pattern, message),
                ));
            }
        }

        if let Some(expected) = self.caller_error {
            if err.is_caller_error() != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "expected a {} error, got: {}",
                        if expected { "caller" } else { "data" },
                        message
                    ),
                ));
            }
        }
        Ok(())
    }

    fn verify_value(&self, step: &str, value: &Json) -> ScenarioResult<()> {
        if self.null && !value.is_null() {
            return Err(ScenarioError::assertion_failed(
                step,
                format!("expected null, got {}", value),
            ));
        }

        if let Some(expected) = self.rows {
            let actual = value.as_array().map(Vec::len);
            if actual != Some(expected) {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!("expected {} rows, got {}", expected, value),
                ));
            }
        }

        if let Some(expected) = &self.returns {
            if value != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "result mismatch:\n  expected: {}\n  actual:   {}",
                        expected, value
                    ),
                ));
            }
        }

        if let Some(expected) = &self.first {
            let row = match value {
                Json::Array(rows) => rows.first(),
                Json::Object(_) => Some(value),
                _ => None,
            };
            let matches = match (row, expected.as_object()) {
                (Some(Json::Object(actual)), Some(expected)) => expected
                    .iter()
                    .all(|(key, want)| actual.get(key) == Some(want)),
                _ => false,
            };
            if !matches {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "first row mismatch:\n  expected: {}\n  actual:   {}",
                        expected, value
                    ),
                ));
            }
        }

        if let Some((key, expected)) = &self.column {
            let actual: Vec<Json> = value
                .as_array()
                .map(|rows| {
                    rows.iter()
                        .map(|row| row.get(key).cloned().unwrap_or(Json::Null))
                        .collect()
                })
                .unwrap_or_default();
            if &actual != expected {
                return Err(ScenarioError::assertion_failed(
                    step,
                    format!(
                        "column {} mismatch:\n  expected: {:?}\n  actual:   {:?}",
                        key, expected, actual
                    ),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_column_assertion() {
        let result = Ok(json!([{"name": "Cheer Bear"}, {"name": "Wish Bear"}]));

        let pass = Assertion::new()
            .rows(2)
            .column("name", vec![json!("Cheer Bear"), json!("Wish Bear")]);
        let fail = Assertion::new().column("name", vec![json!("Wish Bear")]);

        assert!(pass.verify("names", &result).is_ok());
        assert!(fail.verify("names", &result).is_err());
    }

    #[test]
    fn test_error_assertions() {
        let result = Err(QueryError::AnchorWithoutOrder);

        assert!(Assertion::new()
            .error("require an `order`")
            .caller_error()
            .verify("anchors", &result)
            .is_ok());
        assert!(Assertion::new().rows(0).verify("anchors", &result).is_err());
        assert!(Assertion::new()
            .data_error()
            .verify("anchors", &result)
            .is_err());
    }

    #[test]
    fn test_failure_names_the_step() {
        let result = Ok(json!(null));

        let err = Assertion::new().rows(1).verify("lonely", &result).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Step lonely: assertion failed: expected 1 rows, got null"
        );
    }
}
