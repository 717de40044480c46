use crate::prelude::StringExt;
use std::{
    error::Error as StdError,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
};
use strum::AsRefStr;
use thiserror::Error as ThisError;

pub trait ErrorMeta {
    fn code(&self) -> ErrorCode;
    fn key(&self) -> ErrorKey;
    fn message(&self) -> ErrorMessage;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ErrorCode(u16);

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Hierarchical error key, `err::<scope>::<kind>[::<subtype>]`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ErrorKey(String);

impl ErrorKey {
    fn scoped(scope: &str, kind: &str, subtype: Option<&str>) -> Self {
        match subtype {
            Some(subtype) => ErrorKey(format!("err::{scope}::{kind}::{subtype}")),
            None => ErrorKey(format!("err::{scope}::{kind}")),
        }
    }

    pub fn internal(kind: &str, subtype: Option<&str>) -> Self {
        Self::scoped("internal", kind, subtype)
    }

    pub fn application(kind: &str, subtype: Option<&str>) -> Self {
        Self::scoped("application", kind, subtype)
    }
}

impl Display for ErrorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ErrorMessage(String);

impl AsRef<str> for ErrorMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ErrorMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

#[derive(ThisError, Clone, Eq, PartialEq, AsRefStr)]
#[strum(serialize_all = "PascalCase")]
pub enum InternalError {
    #[error("An unknown error occurred: {}", .message)]
    UnknownError {
        message: String,
        subtype: Option<String>,
    },
    #[error("A timeout occurred: {}", .message)]
    Timeout {
        message: String,
        subtype: Option<String>,
    },
    #[error("A connection error occurred: {}", .message)]
    ConnectionError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Argument provided is invalid: {}", .message)]
    InvalidArgument {
        message: String,
        subtype: Option<String>,
    },
    #[error("An error while performing an IO operation: {}", .message)]
    IOErr {
        message: String,
        subtype: Option<String>,
    },
    #[error("Configuration error: {}", .message)]
    ConfigurationError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Serialization error: {}", .message)]
    SerializeError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Deserialization error: {}", .message)]
    DeserializeError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Orchestrator error: {}", .message)]
    OrchestratorError {
        message: String,
        subtype: Option<String>,
    },
    #[error("Orchestrator rejected the request: {}", .message)]
    OrchestratorRejection {
        message: String,
        subtype: Option<String>,
    },
    #[error("Transport error calling {}: {}", .url, .message)]
    TransportError {
        message: String,
        url: String,
        subtype: Option<String>,
    },
}

impl InternalError {
    pub fn timeout(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::Timeout {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn serialize_error(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::SerializeError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn deserialize_error(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::DeserializeError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn configuration_error(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::ConfigurationError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn connection_error(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::ConnectionError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn io_err(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::IOErr {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn invalid_argument(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::InvalidArgument {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn orchestrator_error(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::OrchestratorError {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    pub fn orchestrator_rejection(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::OrchestratorRejection {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    /// A failed call to a remote endpoint. `url` is the address that was attempted and
    /// `message` the underlying cause; both end up in the rendered error.
    pub fn transport_error(url: &str, message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Internal(InternalError::TransportError {
            message: message.to_string(),
            url: url.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }

    fn kind(&self) -> (&'static str, u16, Option<&str>) {
        match self {
            InternalError::UnknownError { subtype, .. } => ("unknown", 1000, subtype.as_deref()),
            InternalError::Timeout { subtype, .. } => ("timeout", 1001, subtype.as_deref()),
            InternalError::ConnectionError { subtype, .. } => {
                ("connection_error", 1002, subtype.as_deref())
            }
            InternalError::InvalidArgument { subtype, .. } => {
                ("invalid_argument", 1004, subtype.as_deref())
            }
            InternalError::IOErr { subtype, .. } => ("io_err", 1005, subtype.as_deref()),
            InternalError::ConfigurationError { subtype, .. } => {
                ("configuration_error", 1006, subtype.as_deref())
            }
            InternalError::SerializeError { subtype, .. } => {
                ("serialize_error", 1007, subtype.as_deref())
            }
            InternalError::DeserializeError { subtype, .. } => {
                ("deserialize_error", 1008, subtype.as_deref())
            }
            InternalError::OrchestratorError { subtype, .. } => {
                ("orchestrator_error", 1009, subtype.as_deref())
            }
            InternalError::TransportError { subtype, .. } => {
                ("transport_error", 1010, subtype.as_deref())
            }
            InternalError::OrchestratorRejection { subtype, .. } => {
                ("orchestrator_rejection", 1011, subtype.as_deref())
            }
        }
    }
}

impl ErrorMeta for InternalError {
    fn code(&self) -> ErrorCode {
        ErrorCode(self.kind().1)
    }

    fn key(&self) -> ErrorKey {
        let (kind, _, subtype) = self.kind();
        ErrorKey::internal(kind, subtype)
    }

    fn message(&self) -> ErrorMessage {
        match self {
            InternalError::TransportError { message, url, .. } => {
                ErrorMessage(format!("{url}: {message}"))
            }
            InternalError::UnknownError { message, .. }
            | InternalError::Timeout { message, .. }
            | InternalError::ConnectionError { message, .. }
            | InternalError::InvalidArgument { message, .. }
            | InternalError::IOErr { message, .. }
            | InternalError::ConfigurationError { message, .. }
            | InternalError::SerializeError { message, .. }
            | InternalError::DeserializeError { message, .. }
            | InternalError::OrchestratorError { message, .. }
            | InternalError::OrchestratorRejection { message, .. } => {
                ErrorMessage(message.to_string())
            }
        }
    }
}

impl Debug for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}\n", &self)?;
        let mut current = self.source();

        while let Some(cause) = current {
            writeln!(f, "Caused by:\n\t{}", cause)?;
            current = cause.source();
        }

        Ok(())
    }
}

/// Errors caused by what the caller asked for rather than by the conductor.
#[derive(ThisError, Debug, Clone, Eq, PartialEq, AsRefStr)]
#[strum(serialize_all = "PascalCase")]
pub enum ApplicationError {
    #[error("Not Found: {}", .message)]
    NotFound {
        message: String,
        subtype: Option<String>,
    },
}

impl ApplicationError {
    pub fn not_found(message: &str, subtype: Option<&str>) -> ConductorError {
        ConductorError::Application(ApplicationError::NotFound {
            message: message.to_string(),
            subtype: subtype.map(|s| s.snake_case()),
        })
    }
}

impl ErrorMeta for ApplicationError {
    fn code(&self) -> ErrorCode {
        match self {
            ApplicationError::NotFound { .. } => ErrorCode(2003),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            ApplicationError::NotFound { subtype, .. } => {
                ErrorKey::application("not_found", subtype.as_deref())
            }
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            ApplicationError::NotFound { message, .. } => ErrorMessage(message.to_string()),
        }
    }
}

#[derive(ThisError, Debug, Clone, Eq, PartialEq)]
pub enum ConductorError {
    Internal(InternalError),
    Application(ApplicationError),
}

impl AsRef<str> for ConductorError {
    fn as_ref(&self) -> &str {
        match self {
            ConductorError::Internal(e) => e.as_ref(),
            ConductorError::Application(e) => e.as_ref(),
        }
    }
}

impl From<anyhow::Error> for ConductorError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast_ref::<ConductorError>() {
            Some(conductor_error) => conductor_error.clone(),
            None => ConductorError::Internal(InternalError::UnknownError {
                message: error.to_string(),
                subtype: None,
            }),
        }
    }
}

impl From<serde_json::Error> for ConductorError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_data() || error.is_syntax() || error.is_eof() {
            InternalError::deserialize_error(&error.to_string(), None)
        } else {
            InternalError::serialize_error(&error.to_string(), None)
        }
    }
}

impl From<kube::Error> for ConductorError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => {
                let message =
                    format!("{} ({}): {}", response.status, response.code, response.message);
                let reason = (!response.reason.is_empty()).then_some(response.reason.as_str());

                // 409 and 429 clear up once the competing write or the rate limit is gone.
                match response.code {
                    400..=499 if response.code != 409 && response.code != 429 => {
                        InternalError::orchestrator_rejection(&message, reason)
                    }
                    _ => InternalError::orchestrator_error(&message, reason),
                }
            }
            kube::Error::SerdeError(e) => {
                InternalError::deserialize_error(&e.to_string(), Some("orchestrator response"))
            }
            kube::Error::InferConfig(e) => {
                InternalError::configuration_error(&e.to_string(), Some("kubeconfig"))
            }
            other => InternalError::orchestrator_error(&other.to_string(), None),
        }
    }
}

impl ConductorError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConductorError::Application(ApplicationError::NotFound { .. })
        )
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ConductorError::Internal(InternalError::ConfigurationError { .. })
        )
    }

    /// Whether delivering the same input again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConductorError::Internal(
                InternalError::OrchestratorError { .. }
                    | InternalError::TransportError { .. }
                    | InternalError::ConnectionError { .. }
                    | InternalError::IOErr { .. }
                    | InternalError::Timeout { .. }
            )
        )
    }
}

impl ErrorMeta for ConductorError {
    fn code(&self) -> ErrorCode {
        match self {
            ConductorError::Internal(e) => e.code(),
            ConductorError::Application(e) => e.code(),
        }
    }

    fn key(&self) -> ErrorKey {
        match self {
            ConductorError::Internal(e) => e.key(),
            ConductorError::Application(e) => e.key(),
        }
    }

    fn message(&self) -> ErrorMessage {
        match self {
            ConductorError::Internal(e) => e.message(),
            ConductorError::Application(e) => e.message(),
        }
    }
}

impl Display for ConductorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ConductorError::Internal(e) => write!(f, "{}", e),
            ConductorError::Application(e) => write!(f, "{}", e),
        }
    }
}
