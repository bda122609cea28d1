//! Error taxonomy shared by the fetcher, the store and the pipeline.

use thiserror::Error;

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum WeatherError {
    /// Connection refused, timeout, DNS failure, body read interrupted.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-2xx status.
    #[error("Provider request failed with status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WeatherError {
    /// Whether the fetcher should try the request again.
    ///
    /// Transport failures always qualify. Provider statuses only qualify when
    /// they describe a transient condition (408, 429, 5xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Provider { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => {
                "Could not reach the weather service. Check your connection.".to_string()
            }
            Self::Provider { status: 401, .. } => {
                "The weather service rejected the API key.\n\
                 Hint: run `wxlog configure` and enter a valid key."
                    .to_string()
            }
            Self::Provider { status: 404, .. } => "Invalid city name or no data found.".to_string(),
            Self::Provider { status: 429, .. } => {
                "Too many requests to the weather service. Try again later.".to_string()
            }
            Self::Provider { status, .. } => format!("Weather service error (HTTP {status})."),
            Self::MalformedResponse(_) => {
                "The weather service returned unexpected data.".to_string()
            }
            Self::Storage(_) => "Local weather database error.".to_string(),
            Self::InvalidLocation(msg) => msg.clone(),
            Self::Config(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(status: u16) -> WeatherError {
        WeatherError::Provider {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(WeatherError::Network("connection reset".into()).is_retryable());
    }

    #[test]
    fn transient_statuses_are_retryable() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(provider(status).is_retryable(), "{status}");
        }
    }

    #[test]
    fn client_statuses_are_not_retryable() {
        for status in [400, 401, 403, 404] {
            assert!(!provider(status).is_retryable(), "{status}");
        }
    }

    #[test]
    fn malformed_and_config_errors_are_not_retryable() {
        assert!(!WeatherError::MalformedResponse("not json".into()).is_retryable());
        assert!(!WeatherError::Config("missing key".into()).is_retryable());
        assert!(!WeatherError::InvalidLocation("".into()).is_retryable());
    }

    #[test]
    fn user_messages() {
        assert!(provider(401).user_message().contains("wxlog configure"));
        assert!(provider(404).user_message().contains("Invalid city"));
        assert!(provider(503).user_message().contains("503"));
        let network = WeatherError::Network("x".into());
        assert!(network.user_message().contains("connection"));
    }
}
