//! Terraform outputs as seen by the IAAS layer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bbl_state::State;

use crate::error::{IaasError, IaasResult};

/// Terraform outputs keyed by output name.
///
/// Backed by an ordered map so anything rendered from it does not depend on
/// the order terraform reported the outputs in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outputs(BTreeMap<String, Value>);

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Output rendered as a plain string. Non-string scalars are formatted.
    pub fn string(&self, name: &str) -> IaasResult<String> {
        match self.0.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Null) | None => Err(IaasError::MissingOutput(name.to_string())),
            Some(other) => Ok(other.to_string()),
        }
    }

    /// Output value as-is.
    pub fn value(&self, name: &str) -> IaasResult<Value> {
        self.0
            .get(name)
            .cloned()
            .ok_or_else(|| IaasError::MissingOutput(name.to_string()))
    }

    /// Names from `required` that are absent.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| !matches!(self.0.get(*name), Some(v) if !v.is_null()))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for Outputs {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Outputs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Anything that can report the terraform outputs of an environment.
#[async_trait]
pub trait OutputSource: Send + Sync {
    async fn outputs(&self, state: &State) -> IaasResult<Outputs>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_output() {
        let outputs = Outputs::new()
            .with("network_name", "bbl-env-network")
            .with("port", json!(22))
            .with("gone", Value::Null);

        assert_eq!(outputs.string("network_name").unwrap(), "bbl-env-network");
        assert_eq!(outputs.string("port").unwrap(), "22");
        assert!(matches!(
            outputs.string("gone"),
            Err(IaasError::MissingOutput(name)) if name == "gone"
        ));
    }

    #[test]
    fn test_missing_outputs() {
        let outputs = Outputs::new().with("a", "1").with("c", Value::Null);
        assert_eq!(outputs.missing(&["a", "b", "c"]), vec!["b", "c"]);
    }
}
