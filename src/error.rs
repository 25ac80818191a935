// MIT License - Copyright (c) 2026 Peter Wright
// Error taxonomy

/// All errors that can occur in the vedo-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Login failed after the alarm client exhausted its own retries.
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    /// Network or protocol failure while talking to the panel.
    #[error("Communication error during {operation}: {reason}")]
    Communication { operation: String, reason: String },

    /// Missing or invalid configuration. Not retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Target state {target} is not enabled for this alarm")]
    InvalidTarget { target: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("MQTT error: {0}")]
    Mqtt(String),
}

impl BridgeError {
    pub fn auth(reason: impl Into<String>) -> Self {
        Self::Auth { reason: reason.into() }
    }

    pub fn communication(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Communication {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is transient; the next poll tick may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Auth { .. }
                | BridgeError::Communication { .. }
                | BridgeError::Io(_)
                | BridgeError::Mqtt(_)
        )
    }
}

impl From<rumqttc::ClientError> for BridgeError {
    fn from(e: rumqttc::ClientError) -> Self {
        BridgeError::Mqtt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
