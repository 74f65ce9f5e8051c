//! Environment ids.

use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::error::CliError;

const NAME_PATTERN: &str = r"^[a-z](?:[-a-z0-9]*[a-z0-9])?$";

/// A fresh id of the form `bbl-env-<8 hex chars>-<utc timestamp>`.
pub fn generate() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "bbl-env-{}-{}",
        &suffix[..8],
        Utc::now().format("%Y-%m-%dt%H-%Mz")
    )
}

/// Pick the env id for `up`.
///
/// An existing id wins; `--name` may only repeat it.
pub fn resolve(current: &str, name: Option<&str>) -> Result<String, CliError> {
    match name {
        Some(name) if !current.is_empty() && current != name => {
            Err(CliError::EnvIdConflict(current.to_string()))
        }
        Some(name) => {
            validate_name(name)?;
            Ok(name.to_string())
        }
        None if current.is_empty() => Ok(generate()),
        None => Ok(current.to_string()),
    }
}

fn validate_name(name: &str) -> Result<(), CliError> {
    let valid = Regex::new(NAME_PATTERN)
        .map(|re| re.is_match(name))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(CliError::InvalidName)
    }
}
