// Configuration errors

use thiserror::Error;

/// A problem with the profile itself rather than with the data being
/// verified. These abort a `verify` call; data problems never do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    #[error("Verification interrupted: {0}")]
    Interrupted(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigurationError::UnknownFilter("foobazgorch".into()).to_string(),
            "Unknown filter: foobazgorch"
        );
        assert_eq!(
            ConfigurationError::UnknownType("Decimal".into()).to_string(),
            "Unknown type: Decimal"
        );
        assert_eq!(
            ConfigurationError::Interrupted("task 3 cancelled".into()).to_string(),
            "Verification interrupted: task 3 cancelled"
        );
    }
}
