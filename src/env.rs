//! Runtime environment detection.
//!
//! Single source of truth for the runtime environment (test or production),
//! read from the `RECEIPT_ENV` environment variable.
//!
//! # Environment Variable
//!
//! Set `RECEIPT_ENV` to one of:
//! - `test` - Test mode (file-backed credential store instead of keyring)
//! - `system_test` - System test mode (also file-backed)
//! - (anything else or unset) - Production mode

/// Application name, used for config directories and the default keyring service.
pub const APP_NAME: &str = "receipt-delivery";

/// Environment variable selecting the runtime environment.
pub const ENV_VAR: &str = "RECEIPT_ENV";

/// Runtime environment for the receipt sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment (default).
    Production,
    /// Test environment - uses file storage.
    Test,
    /// System test environment - uses file storage, talks to a test server.
    SystemTest,
}

impl Environment {
    /// Detect current environment from `RECEIPT_ENV`.
    #[must_use]
    pub fn current() -> Self {
        Self::parse(std::env::var(ENV_VAR).ok().as_deref())
    }

    /// Map a raw `RECEIPT_ENV` value to an environment.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("test") => Self::Test,
            Some("system_test") => Self::SystemTest,
            _ => Self::Production,
        }
    }

    /// Returns `true` if running in any test mode (test or system_test).
    /// Use this to skip the OS keyring and use file storage instead.
    #[must_use]
    pub fn is_any_test(self) -> bool {
        matches!(self, Self::Test | Self::SystemTest)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Test => write!(f, "test"),
            Self::SystemTest => write!(f, "system_test"),
        }
    }
}

/// Returns `true` if the keyring should be bypassed (any test mode).
#[must_use]
pub fn should_skip_keyring() -> bool {
    Environment::current().is_any_test()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_values() {
        assert_eq!(Environment::parse(Some("test")), Environment::Test);
        assert_eq!(Environment::parse(Some("system_test")), Environment::SystemTest);
    }

    #[test]
    fn test_parse_defaults_to_production() {
        assert_eq!(Environment::parse(None), Environment::Production);
        assert_eq!(Environment::parse(Some("staging")), Environment::Production);
        assert_eq!(Environment::parse(Some("development")), Environment::Production);
    }

    #[test]
    fn test_any_test_covers_both_test_modes() {
        assert!(Environment::Test.is_any_test());
        assert!(Environment::SystemTest.is_any_test());
        assert!(!Environment::Production.is_any_test());
    }

    #[test]
    fn test_display() {
        assert_eq!(Environment::SystemTest.to_string(), "system_test");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
