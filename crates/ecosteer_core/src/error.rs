//! Error types for behavior registration.
//!
//! Force computation itself never fails; every error here is raised while a
//! registry is being assembled, either by hand or from a species profile.

use thiserror::Error;

/// Registration failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The behavior id was empty or only whitespace.
    #[error("behavior id must not be empty")]
    EmptyId,

    /// A rule is already registered under this id.
    #[error("behavior '{0}' is already registered")]
    DuplicateId(String),

    /// The id does not name a known behavior.
    #[error("unknown behavior '{0}'")]
    UnknownBehavior(String),

    /// No rule could be supplied for the id.
    #[error("no rule available for behavior '{0}'")]
    MissingRule(String),

    /// The category label is not recognised.
    #[error("unknown behavior category '{0}'")]
    UnknownCategory(String),
}

/// Result alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::DuplicateId("separation".to_string());
        assert_eq!(err.to_string(), "behavior 'separation' is already registered");
        assert_eq!(
            RegistryError::EmptyId.to_string(),
            "behavior id must not be empty"
        );
    }
}
