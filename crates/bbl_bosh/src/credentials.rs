//! Values bbl reads out of bosh vars stores.

use std::path::Path;

use serde_yaml::Value;

use crate::error::{BoshError, BoshResult};

/// The user `bosh.yml` creates for the director.
pub const DIRECTOR_USERNAME: &str = "admin";

/// Director login and TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorCredentials {
    pub username: String,
    pub password: String,
    pub ca: String,
    pub certificate: String,
    pub private_key: String,
}

impl DirectorCredentials {
    /// Extract the credentials from a director vars store.
    pub fn from_vars_store(vars_store: &str) -> BoshResult<Self> {
        let vars = parse(vars_store)?;
        Ok(Self {
            username: DIRECTOR_USERNAME.to_string(),
            password: lookup(&vars, &["admin_password"])?,
            ca: lookup(&vars, &["director_ssl", "ca"])?,
            certificate: lookup(&vars, &["director_ssl", "certificate"])?,
            private_key: lookup(&vars, &["director_ssl", "private_key"])?,
        })
    }
}

/// Private key of the `jumpbox` ssh user.
pub fn jumpbox_private_key(vars_store: &str) -> BoshResult<String> {
    lookup(&parse(vars_store)?, &["jumpbox_ssh", "private_key"])
}

/// `BOSH_ALL_PROXY` value that tunnels director traffic through the jumpbox.
pub fn all_proxy(jumpbox_url: &str, private_key_path: &Path) -> String {
    format!(
        "ssh+socks5://jumpbox@{}?private-key={}",
        jumpbox_url,
        private_key_path.display()
    )
}

fn parse(vars_store: &str) -> BoshResult<Value> {
    serde_yaml::from_str(vars_store).map_err(BoshError::VarsStore)
}

fn lookup(vars: &Value, path: &[&str]) -> BoshResult<String> {
    path.iter()
        .try_fold(vars, |value, key| value.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| BoshError::MissingVariable(path.join(".")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS_STORE: &str = "admin_password: some-admin-password
director_ssl:
  ca: some-ca
  certificate: some-certificate
  private_key: some-private-key
jumpbox_ssh:
  private_key: some-jumpbox-key
  public_key: some-public-key
";

    #[test]
    fn test_director_credentials() {
        let credentials = DirectorCredentials::from_vars_store(VARS_STORE).unwrap();

        assert_eq!(credentials.username, "admin");
        assert_eq!(credentials.password, "some-admin-password");
        assert_eq!(credentials.ca, "some-ca");
        assert_eq!(credentials.certificate, "some-certificate");
        assert_eq!(credentials.private_key, "some-private-key");
    }

    #[test]
    fn test_missing_variable() {
        let err = DirectorCredentials::from_vars_store("admin_password: pw\n").unwrap_err();
        assert_eq!(err.to_string(), "vars store has no value for director_ssl.ca");
    }

    #[test]
    fn test_jumpbox_private_key() {
        assert_eq!(jumpbox_private_key(VARS_STORE).unwrap(), "some-jumpbox-key");
    }

    #[test]
    fn test_all_proxy() {
        assert_eq!(
            all_proxy("35.1.2.3:22", Path::new("/tmp/jumpbox.key")),
            "ssh+socks5://jumpbox@35.1.2.3:22?private-key=/tmp/jumpbox.key"
        );
    }
}
