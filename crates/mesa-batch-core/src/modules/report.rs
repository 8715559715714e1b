use crate::domain::BatchError;
use serde::Serialize;

/// A batch item that failed while the rest of the batch carried on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub item: String,
    pub category: String,
    pub code: String,
    pub message: String,
}

impl ItemFailure {
    pub fn new(item: impl Into<String>, error: &BatchError) -> Self {
        Self {
            item: item.into(),
            category: error.category().as_str().to_string(),
            code: error.code().to_string(),
            message: error.message().to_string(),
        }
    }

    /// Logs the failure and returns it for the report.
    pub fn record(item: impl Into<String>, error: &BatchError) -> Self {
        let failure = Self::new(item, error);
        tracing::warn!(
            item = %failure.item,
            code = %failure.code,
            "{}",
            failure.message
        );
        failure
    }
}
