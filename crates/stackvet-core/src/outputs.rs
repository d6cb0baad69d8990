//! Output values captured from one provisioning run.
//!
//! Outputs are parsed once from `terraform output -json` and are immutable
//! afterwards. Checks read them through accessors that treat a missing or
//! empty required key as an error, so resource queries are never issued
//! against an absent identifier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a check reads a required output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OutputError {
    /// The output key does not exist.
    #[error("required output '{0}' is missing")]
    Missing(String),

    /// The output exists but holds an empty string or empty list.
    #[error("required output '{0}' is empty")]
    Empty(String),

    /// The output exists but is not the requested shape.
    #[error("output '{key}' is not a {expected}")]
    WrongKind { key: String, expected: &'static str },
}

/// A single output value: a string or an ordered list of strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OutputValue {
    String(String),
    List(Vec<String>),
}

/// Immutable snapshot of the named outputs of one provisioning run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackOutputs {
    values: BTreeMap<String, OutputValue>,
}

impl StackOutputs {
    pub fn new(values: BTreeMap<String, OutputValue>) -> Self {
        Self { values }
    }

    /// Parse the JSON document emitted by `terraform output -json`.
    ///
    /// Each entry has the shape `{"<name>": {"value": ..., "type": ...}}`.
    /// String values and lists of strings map directly; other scalars are
    /// stringified, and compound values are kept as their compact JSON text
    /// so unexpected output shapes never fail the parse.
    pub fn from_terraform_json(raw: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct RawOutput {
            value: serde_json::Value,
        }

        let raw: BTreeMap<String, RawOutput> = serde_json::from_str(raw)?;
        let mut values = BTreeMap::new();
        for (name, output) in raw {
            values.insert(name, coerce_value(output.value));
        }
        Ok(Self { values })
    }

    /// Whether the run produced no outputs at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Required single-value output. Missing or empty is an error.
    pub fn get(&self, key: &str) -> Result<&str, OutputError> {
        match self.values.get(key) {
            None => Err(OutputError::Missing(key.to_string())),
            Some(OutputValue::String(s)) if s.is_empty() => {
                Err(OutputError::Empty(key.to_string()))
            }
            Some(OutputValue::String(s)) => Ok(s),
            Some(OutputValue::List(_)) => Err(OutputError::WrongKind {
                key: key.to_string(),
                expected: "string",
            }),
        }
    }

    /// Required list output. Missing or empty is an error.
    pub fn get_list(&self, key: &str) -> Result<&[String], OutputError> {
        match self.values.get(key) {
            None => Err(OutputError::Missing(key.to_string())),
            Some(OutputValue::List(items)) if items.is_empty() => {
                Err(OutputError::Empty(key.to_string()))
            }
            Some(OutputValue::List(items)) => Ok(items),
            Some(OutputValue::String(_)) => Err(OutputError::WrongKind {
                key: key.to_string(),
                expected: "list",
            }),
        }
    }

    /// Optional single-value output. An empty string reads as absent.
    pub fn try_get(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(OutputValue::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Builder-style insert of a string output (fakes and tests).
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values
            .insert(key.into(), OutputValue::String(value.into()));
        self
    }

    /// Builder-style insert of a list output (fakes and tests).
    pub fn with_list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.insert(
            key.into(),
            OutputValue::List(values.into_iter().map(Into::into).collect()),
        );
        self
    }
}

fn coerce_value(value: serde_json::Value) -> OutputValue {
    match value {
        serde_json::Value::String(s) => OutputValue::String(s),
        serde_json::Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_json::Value::String(s) => list.push(s),
                    other => list.push(other.to_string()),
                }
            }
            OutputValue::List(list)
        }
        serde_json::Value::Bool(b) => OutputValue::String(b.to_string()),
        serde_json::Value::Number(n) => OutputValue::String(n.to_string()),
        serde_json::Value::Null => OutputValue::String(String::new()),
        other => OutputValue::String(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "vpc_id": {"sensitive": false, "type": "string", "value": "vpc-0abc"},
        "vpc_cidr": {"sensitive": false, "type": "string", "value": "10.42.0.0/16"},
        "private_subnet_ids": {
            "sensitive": false,
            "type": ["list", "string"],
            "value": ["subnet-a", "subnet-b", "subnet-c"]
        },
        "instance_count": {"sensitive": false, "type": "number", "value": 1},
        "empty_output": {"sensitive": false, "type": "string", "value": ""}
    }"#;

    #[test]
    fn test_parse_terraform_output_json() {
        let outputs = StackOutputs::from_terraform_json(SAMPLE).expect("parse failed");
        assert_eq!(outputs.len(), 5);
        assert_eq!(outputs.get("vpc_id").unwrap(), "vpc-0abc");
        assert_eq!(
            outputs.get_list("private_subnet_ids").unwrap(),
            &["subnet-a", "subnet-b", "subnet-c"]
        );
        // Numbers are stringified
        assert_eq!(outputs.get("instance_count").unwrap(), "1");
    }

    #[test]
    fn test_missing_output_is_an_error() {
        let outputs = StackOutputs::default();
        assert_eq!(
            outputs.get("vpc_id"),
            Err(OutputError::Missing("vpc_id".to_string()))
        );
        assert_eq!(
            outputs.get_list("private_subnet_ids"),
            Err(OutputError::Missing("private_subnet_ids".to_string()))
        );
    }

    #[test]
    fn test_empty_output_is_an_error() {
        let outputs = StackOutputs::from_terraform_json(SAMPLE).expect("parse failed");
        assert_eq!(
            outputs.get("empty_output"),
            Err(OutputError::Empty("empty_output".to_string()))
        );

        let outputs = StackOutputs::default().with_list("ids", Vec::<String>::new());
        assert_eq!(
            outputs.get_list("ids"),
            Err(OutputError::Empty("ids".to_string()))
        );
    }

    #[test]
    fn test_wrong_kind_is_an_error() {
        let outputs = StackOutputs::from_terraform_json(SAMPLE).expect("parse failed");
        assert_eq!(
            outputs.get("private_subnet_ids"),
            Err(OutputError::WrongKind {
                key: "private_subnet_ids".to_string(),
                expected: "string",
            })
        );
        assert_eq!(
            outputs.get_list("vpc_id"),
            Err(OutputError::WrongKind {
                key: "vpc_id".to_string(),
                expected: "list",
            })
        );
    }

    #[test]
    fn test_try_get_treats_empty_as_absent() {
        let outputs = StackOutputs::from_terraform_json(SAMPLE).expect("parse failed");
        assert_eq!(outputs.try_get("vpc_id"), Some("vpc-0abc"));
        assert_eq!(outputs.try_get("empty_output"), None);
        assert_eq!(outputs.try_get("nonexistent"), None);
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(StackOutputs::from_terraform_json("not json").is_err());
    }
}
