//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} {}", e.var_name, e.cause),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("127.0.0.1", "server.host").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_default_used_when_unset() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("QUIRE_EXPAND_UNSET");
        }
        assert_eq!(
            expand_env("${QUIRE_EXPAND_UNSET:-0.0.0.0}", "server.host").unwrap(),
            "0.0.0.0"
        );
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("QUIRE_EXPAND_MISSING");
        }
        let err = expand_env("${QUIRE_EXPAND_MISSING}", "server.host").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("server.host"));
        assert!(message.contains("QUIRE_EXPAND_MISSING"));
    }
}
