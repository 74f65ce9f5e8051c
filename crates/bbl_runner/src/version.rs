//! Version string extraction for tool `version` output.

use std::sync::OnceLock;

use regex::Regex;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("version pattern is valid"))
}

/// Return the first `major.minor.patch` found in `output`.
pub fn extract_version(output: &str) -> Option<String> {
    version_pattern()
        .find(output)
        .map(|m| m.as_str().to_string())
}

/// Compare two `major.minor.patch` strings numerically.
///
/// Unparseable components count as zero.
pub fn version_at_least(version: &str, minimum: &str) -> bool {
    parse(version) >= parse(minimum)
}

fn parse(version: &str) -> (u64, u64, u64) {
    let mut parts = version
        .split('.')
        .map(|p| p.trim().parse::<u64>().unwrap_or(0));
    (
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
        parts.next().unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_terraform_version() {
        assert_eq!(
            extract_version("Terraform v0.11.7\n"),
            Some("0.11.7".to_string())
        );
    }

    #[test]
    fn test_extract_bosh_version() {
        let output = "version 2.0.48-e94aeeda-2018-01-09T23:08:07Z\n\nSucceeded\n";
        assert_eq!(extract_version(output), Some("2.0.48".to_string()));
    }

    #[test]
    fn test_extract_without_version() {
        assert_eq!(extract_version("Terraform vdev"), None);
        assert_eq!(extract_version("1.2"), None);
    }

    #[test]
    fn test_version_at_least() {
        assert!(version_at_least("2.0.48", "2.0.0"));
        assert!(version_at_least("0.10.0", "0.10.0"));
        assert!(version_at_least("0.11.7", "0.10.0"));
        assert!(!version_at_least("1.1.0", "2.0.0"));
        assert!(!version_at_least("0.9.11", "0.10.0"));
    }
}
