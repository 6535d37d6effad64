use crate::domain::model::{ErrorKind, ServiceKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("No registered agent provides capability '{capability_id}' for {service}")]
    UnknownCapability {
        service: ServiceKind,
        capability_id: String,
    },

    #[error("Capability '{capability_id}' timed out after {elapsed_ms}ms")]
    Timeout {
        capability_id: String,
        elapsed_ms: u64,
    },

    #[error("Request deadline passed before '{capability_id}' could be invoked")]
    DeadlineExceeded { capability_id: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("Remote booking failed: {message}")]
    RemoteBookingFailed { message: String },

    #[error("Interpretation failed: {message}")]
    InterpretationFailed { message: String },

    #[error("No outcome recorded for requested service {service}")]
    MissingOutcome { service: ServiceKind },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlannerError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteBookingFailed {
            message: message.into(),
        }
    }

    pub fn interpretation(message: impl Into<String>) -> Self {
        Self::InterpretationFailed {
            message: message.into(),
        }
    }

    /// 對應到對外公開的錯誤分類
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::UnknownCapability { .. } => ErrorKind::UnknownCapability,
            PlannerError::Timeout { .. } | PlannerError::DeadlineExceeded { .. } => ErrorKind::Timeout,
            PlannerError::RemoteBookingFailed { .. } => ErrorKind::RemoteBookingFailed,
            PlannerError::InterpretationFailed { .. } => ErrorKind::InterpretationFailed,
            PlannerError::MissingOutcome { .. } => ErrorKind::MissingOutcome,
            PlannerError::HttpError(e) if e.is_timeout() => ErrorKind::Timeout,
            PlannerError::TransportError { .. }
            | PlannerError::HttpError(_)
            | PlannerError::IoError(_)
            | PlannerError::SerializationError(_)
            | PlannerError::ConfigError { .. }
            | PlannerError::InvalidConfigValueError { .. }
            | PlannerError::MissingConfigError { .. } => ErrorKind::TransportError,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlannerError::Timeout { .. }
            | PlannerError::DeadlineExceeded { .. }
            | PlannerError::HttpError(_) => ErrorSeverity::Medium,
            PlannerError::UnknownCapability { .. }
            | PlannerError::TransportError { .. }
            | PlannerError::RemoteBookingFailed { .. }
            | PlannerError::InterpretationFailed { .. } => ErrorSeverity::High,
            PlannerError::MissingOutcome { .. } | PlannerError::IoError(_) => {
                ErrorSeverity::Critical
            }
            PlannerError::SerializationError(_)
            | PlannerError::ConfigError { .. }
            | PlannerError::InvalidConfigValueError { .. }
            | PlannerError::MissingConfigError { .. } => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PlannerError::InvalidConfigValueError { field, reason, .. } => {
                format!("設定值錯誤 ({}): {}", field, reason)
            }
            PlannerError::MissingConfigError { field } => format!("缺少必要設定: {}", field),
            PlannerError::ConfigError { message } => format!("設定檔錯誤: {}", message),
            PlannerError::InterpretationFailed { message } => {
                format!("無法理解旅遊需求: {}", message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlannerError::UnknownCapability { .. } => {
                "Check that the specialist agents are running and listed under [discovery] or [[capabilities]]"
            }
            PlannerError::Timeout { .. } | PlannerError::HttpError(_) => {
                "The agent may be overloaded; raise [dispatch].default_timeout_ms or retry later"
            }
            PlannerError::DeadlineExceeded { .. } => {
                "Raise [dispatch].request_deadline_ms or request fewer services at once"
            }
            PlannerError::TransportError { .. } => "Verify the agent endpoint URLs and network access",
            PlannerError::RemoteBookingFailed { .. } => {
                "The agent rejected the booking; adjust dates or party size and try again"
            }
            PlannerError::InterpretationFailed { .. } => {
                "Mention what to book (flight, hotel, car) and where, e.g. 'flight from Singapore to Tokyo'"
            }
            PlannerError::MissingOutcome { .. } => "This is an internal defect; please report it",
            PlannerError::IoError(_) => "Check that the file exists and is readable",
            PlannerError::SerializationError(_) => "Check that the JSON input is well formed",
            PlannerError::ConfigError { .. }
            | PlannerError::InvalidConfigValueError { .. }
            | PlannerError::MissingConfigError { .. } => {
                "Fix the configuration file and run again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping_covers_taxonomy() {
        let unknown = PlannerError::UnknownCapability {
            service: ServiceKind::Hotel,
            capability_id: "bookHotel".to_string(),
        };
        assert_eq!(unknown.kind(), ErrorKind::UnknownCapability);
        assert_eq!(
            PlannerError::Timeout {
                capability_id: "searchFlights".to_string(),
                elapsed_ms: 10
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            PlannerError::DeadlineExceeded {
                capability_id: "bookFlight".to_string()
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(PlannerError::transport("reset").kind(), ErrorKind::TransportError);
        assert_eq!(PlannerError::remote("Pending").kind(), ErrorKind::RemoteBookingFailed);
        assert_eq!(
            PlannerError::interpretation("empty").kind(),
            ErrorKind::InterpretationFailed
        );
        assert_eq!(
            PlannerError::MissingOutcome {
                service: ServiceKind::Flight
            }
            .kind(),
            ErrorKind::MissingOutcome
        );
    }

    #[test]
    fn test_serde_failure_is_transport() {
        let err: PlannerError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::TransportError);
    }

    #[test]
    fn test_display_mentions_capability() {
        let err = PlannerError::UnknownCapability {
            service: ServiceKind::CarRental,
            capability_id: "bookCar".to_string(),
        };
        assert!(err.to_string().contains("bookCar"));
        assert!(err.to_string().contains("Car Rental"));
    }
}
