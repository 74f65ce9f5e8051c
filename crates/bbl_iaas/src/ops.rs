//! Ops-file (go-patch) operations and deployment vars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::IaasResult;

/// go-patch operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Replace,
    Remove,
}

/// A single ops-file entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    #[serde(rename = "type")]
    pub op_type: OpType,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Op {
    pub fn replace(path: impl Into<String>, value: Value) -> Self {
        Self {
            op_type: OpType::Replace,
            path: path.into(),
            value: Some(value),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self {
            op_type: OpType::Remove,
            path: path.into(),
            value: None,
        }
    }
}

/// Render an ops list as YAML.
pub fn render_ops(ops: &[Op]) -> IaasResult<String> {
    Ok(serde_yaml::to_string(ops)?)
}

/// Variables handed to `bosh interpolate --vars-file`, sorted by name.
pub type DeploymentVars = BTreeMap<String, Value>;

/// Render deployment vars as YAML.
pub fn render_vars(vars: &DeploymentVars) -> IaasResult<String> {
    Ok(serde_yaml::to_string(vars)?)
}

/// Replace the availability zones of the base cloud config.
pub(crate) fn azs(cloud_properties: [Value; 3]) -> Op {
    let zones: Vec<Value> = cloud_properties
        .into_iter()
        .zip(["z1", "z2", "z3"])
        .map(|(props, name)| {
            if props.is_null() {
                json!({ "name": name })
            } else {
                json!({ "name": name, "cloud_properties": props })
            }
        })
        .collect();
    Op::replace("/azs", Value::Array(zones))
}

/// Replace the subnets of the `default` network with one subnet spanning all zones.
pub(crate) fn default_subnet(cloud_properties: Value) -> Op {
    Op::replace(
        "/networks/name=default/subnets",
        json!([{
            "range": "10.0.16.0/20",
            "gateway": "10.0.16.1",
            "reserved": ["10.0.16.2-10.0.16.3", "10.0.31.255"],
            "static": ["10.0.31.190-10.0.31.254"],
            "azs": ["z1", "z2", "z3"],
            "cloud_properties": cloud_properties,
        }]),
    )
}

/// Append a vm extension.
pub(crate) fn vm_extension(name: &str, cloud_properties: Value) -> Op {
    Op::replace(
        "/vm_extensions/-",
        json!({ "name": name, "cloud_properties": cloud_properties }),
    )
}
