use std::fmt::{Display, Formatter};

pub type BatchResult<T> = Result<T, BatchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchErrorCategory {
    ValidationError,
    ParseError,
    MissingFieldError,
    MismatchError,
    IoSystemError,
    SimulationError,
    InternalError,
}

impl BatchErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::ValidationError => 2,
            Self::ParseError => 3,
            Self::MissingFieldError => 4,
            Self::MismatchError => 5,
            Self::IoSystemError => 6,
            Self::SimulationError => 7,
            Self::InternalError => 8,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "ValidationError",
            Self::ParseError => "ParseError",
            Self::MissingFieldError => "MissingFieldError",
            Self::MismatchError => "MismatchError",
            Self::IoSystemError => "IoSystemError",
            Self::SimulationError => "SimulationError",
            Self::InternalError => "InternalError",
        }
    }
}

impl Display for BatchErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Error shared by the codec, the inlist model and the batch drivers.
///
/// `code` is a short dotted identifier (`PARSE.RUN_NAME_PREFIX`) that stays
/// stable across message wording changes, so callers and tests can match on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{category} [{code}] {message}")]
pub struct BatchError {
    category: BatchErrorCategory,
    code: &'static str,
    message: String,
}

impl BatchError {
    pub fn new(category: BatchErrorCategory, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::ValidationError, code, message)
    }

    pub fn parse(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::ParseError, code, message)
    }

    pub fn missing_field(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::MissingFieldError, code, message)
    }

    pub fn mismatch(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::MismatchError, code, message)
    }

    pub fn io_system(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::IoSystemError, code, message)
    }

    pub fn simulation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::SimulationError, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(BatchErrorCategory::InternalError, code, message)
    }

    pub const fn category(&self) -> BatchErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }
}
