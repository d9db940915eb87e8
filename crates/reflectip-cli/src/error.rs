use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] reflectip_core::ValidationError),

    #[error("interrupted before an address was determined")]
    Cancelled,

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Cancelled => 130,
            Self::Serialization(_) | Self::Timestamp(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use reflectip_core::ValidationError;

    use super::*;

    #[test]
    fn exit_codes_by_category() {
        assert_eq!(CliError::from(ValidationError::NoProviders).exit_code(), 2);
        assert_eq!(CliError::Cancelled.exit_code(), 130);
        assert_eq!(
            CliError::from(std::io::Error::other("closed pipe")).exit_code(),
            10
        );

        let serialization = serde_json::from_str::<serde_json::Value>("{").expect_err("bad json");
        assert_eq!(CliError::from(serialization).exit_code(), 4);
    }
}
