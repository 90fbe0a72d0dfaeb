use std::fmt;

use serde::Deserialize;

// =========================================================
// 错误类别枚举
// =========================================================

/// PostgreSQL `unique_violation`, as reported by the data API's `code` field.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Error kinds, each with its own presentation on the UI side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClubErrorKind {
    /// Service URL or key missing; the app shows the remediation screen.
    Configuration,
    /// Rejected credentials or session; shown inline on the auth forms.
    Auth,
    /// Generic failure reported by the data API.
    Query,
    /// A uniqueness rule rejected the write (duplicate attendance).
    ConstraintViolation,
    /// The request never produced a response.
    Network,
    /// The response body does not match the declared row type.
    Serialization,
    /// A form draft failed validation before any request was made.
    InvalidInput,
}

impl ClubErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            ClubErrorKind::Configuration => "NOT_CONFIGURED",
            ClubErrorKind::Auth => "AUTH_FAILED",
            ClubErrorKind::Query => "QUERY_FAILED",
            ClubErrorKind::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ClubErrorKind::Network => "NETWORK_ERROR",
            ClubErrorKind::Serialization => "BAD_RESPONSE",
            ClubErrorKind::InvalidInput => "INVALID_INPUT",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// One step of the operation trail attached to an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// e.g. "members.select", "auth.sign_in"
    pub operation: String,
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// Application error.
///
/// - kind: which part of the taxonomy it belongs to
/// - message: the human-readable text, shown to users verbatim
/// - source: the underlying error, if any
/// - spans: the operation trail, innermost first
#[derive(Debug)]
pub struct ClubError {
    pub kind: ClubErrorKind,
    pub message: String,
    source: Option<Box<dyn std::error::Error + 'static>>,
    spans: Vec<ErrorSpan>,
}

impl ClubError {
    pub fn new(kind: ClubErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::Configuration, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::Auth, message)
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::Query, message)
    }

    pub fn constraint_violation(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::ConstraintViolation, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::Network, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::Serialization, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ClubErrorKind::InvalidInput, message)
    }

    /// Map a failed data API response to an error.
    ///
    /// `23505` becomes [`ClubErrorKind::ConstraintViolation`]; everything else is a query error.
    pub fn from_data_response(status: u16, body: &str) -> Self {
        let decoded = ServiceErrorBody::decode(body);
        let message = decoded
            .as_ref()
            .and_then(ServiceErrorBody::message)
            .unwrap_or_else(|| format!("request failed with status {status}"));
        let code = decoded.as_ref().and_then(ServiceErrorBody::code);

        if code.as_deref() == Some(UNIQUE_VIOLATION) {
            Self::constraint_violation(message)
        } else {
            Self::query(message)
        }
    }

    /// Map a failed auth endpoint response to an error.
    pub fn from_auth_response(status: u16, body: &str) -> Self {
        let message = ServiceErrorBody::decode(body)
            .as_ref()
            .and_then(ServiceErrorBody::message)
            .unwrap_or_else(|| format!("authentication failed with status {status}"));
        Self::auth(message)
    }

    // --- Context builders ---

    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    pub fn with_source<E: std::error::Error + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.kind == ClubErrorKind::ConstraintViolation
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for ClubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ClubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref()
    }
}

impl From<serde_json::Error> for ClubError {
    fn from(e: serde_json::Error) -> Self {
        ClubError::serialization(e.to_string()).with_source(e)
    }
}

pub type ClubResult<T> = std::result::Result<T, ClubError>;

// =========================================================
// 服务端错误响应体
// =========================================================

/// Error body shapes of the hosted service.
///
/// The data API sends `{code, message, details, hint}`; the auth API sends
/// either `{code, error_code, msg}` or `{error, error_description}`.
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ServiceErrorBody {
    fn decode(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    fn message(&self) -> Option<String> {
        [
            &self.message,
            &self.msg,
            &self.error_description,
            &self.error,
        ]
        .into_iter()
        .flatten()
        .find(|m| !m.trim().is_empty())
        .cloned()
    }

    fn code(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}
