/// Error types for machine translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MtError {
    /// Missing or invalid configuration (API key, config file, ...)
    ConfigError(String),
    /// Locale code that cannot be sent to a provider
    InvalidLocale(String),
    /// Transport failure; the request may never have reached the provider
    NetworkError(String),
    /// Provider rejected the credentials (401/403)
    AuthFailure(String),
    /// Provider asked us to slow down (429)
    RateLimited(String),
    /// Provider answered but the body could not be used
    BadResponse(String),
    /// Any other non-success HTTP status
    HttpStatus { status: u16, message: String },
    /// Caller submitted more texts than one request may carry
    BatchTooLarge { size: usize, max: usize },
    /// Error during translation phase
    TranslationError(String),
}

impl MtError {
    /// Classify a non-success HTTP status returned by a provider
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => MtError::RateLimited(body),
            401 | 403 => MtError::AuthFailure(body),
            _ => MtError::HttpStatus {
                status,
                message: body,
            },
        }
    }

    /// Only rate limiting is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, MtError::RateLimited(_))
    }
}

impl std::fmt::Display for MtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MtError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            MtError::InvalidLocale(msg) => write!(f, "Invalid locale: {}", msg),
            MtError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            MtError::AuthFailure(msg) => write!(f, "Authentication failed: {}", msg),
            MtError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            MtError::BadResponse(msg) => write!(f, "Bad response: {}", msg),
            MtError::HttpStatus { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            MtError::BatchTooLarge { size, max } => {
                write!(f, "Batch of {} texts exceeds the limit of {}", size, max)
            }
            MtError::TranslationError(msg) => write!(f, "Translation error: {}", msg),
        }
    }
}

impl std::error::Error for MtError {}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            MtError::from_status(429, "slow down".into()),
            MtError::RateLimited(_)
        ));
        assert!(matches!(
            MtError::from_status(401, String::new()),
            MtError::AuthFailure(_)
        ));
        assert!(matches!(
            MtError::from_status(403, String::new()),
            MtError::AuthFailure(_)
        ));
        assert_eq!(
            MtError::from_status(500, "boom".into()),
            MtError::HttpStatus {
                status: 500,
                message: "boom".into()
            }
        );
    }

    #[test]
    fn test_only_rate_limit_is_retryable() {
        assert!(MtError::RateLimited(String::new()).is_retryable());
        assert!(!MtError::AuthFailure(String::new()).is_retryable());
        assert!(!MtError::NetworkError(String::new()).is_retryable());
        assert!(!MtError::BadResponse(String::new()).is_retryable());
        assert!(
            !MtError::HttpStatus {
                status: 503,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_display() {
        let err = MtError::BatchTooLarge { size: 60, max: 50 };
        assert_eq!(err.to_string(), "Batch of 60 texts exceeds the limit of 50");
    }
}
