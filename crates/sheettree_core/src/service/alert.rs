//! Engine-boundary errors and their user-facing alerts.
//!
//! # Invariants
//! - `SheetError` is the only error type returned by engine mutations.
//! - Every `SheetError` and `SignInError` maps to exactly one alert text.

use crate::auth::SignInError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const ALERT_TITLE: &str = "Error";

/// Failure of one engine operation. The snapshot is untouched when raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetError {
    FailedToFetch,
    FailedToAddItem,
    FailedToDeleteItem,
}

impl SheetError {
    /// Stable machine-readable code, used in log events.
    pub fn code(self) -> &'static str {
        match self {
            Self::FailedToFetch => "failed_to_fetch",
            Self::FailedToAddItem => "failed_to_add_item",
            Self::FailedToDeleteItem => "failed_to_delete_item",
        }
    }
}

impl Display for SheetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(ErrorAlert::from(*self).message.as_str())
    }
}

impl Error for SheetError {}

/// Title and message of an alert shown for a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorAlert {
    pub title: String,
    pub message: String,
}

impl ErrorAlert {
    fn error(message: &str) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<SheetError> for ErrorAlert {
    fn from(value: SheetError) -> Self {
        match value {
            SheetError::FailedToFetch => Self::error("There was a problem fetching files."),
            SheetError::FailedToAddItem => Self::error("Failed to add item."),
            SheetError::FailedToDeleteItem => Self::error("Failed to delete item."),
        }
    }
}

impl From<SignInError> for ErrorAlert {
    fn from(value: SignInError) -> Self {
        match value {
            SignInError::ScopesMissing => {
                Self::error("Some authorization scopes are missing.\nEditing is disabled.")
            }
            SignInError::UserMissing => Self::error("User authentication failed."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorAlert, SheetError};
    use crate::auth::SignInError;

    #[test]
    fn sheet_errors_map_to_alert_text() {
        let alert = ErrorAlert::from(SheetError::FailedToFetch);
        assert_eq!(alert.title, "Error");
        assert_eq!(alert.message, "There was a problem fetching files.");
        assert_eq!(SheetError::FailedToDeleteItem.to_string(), "Failed to delete item.");
    }

    #[test]
    fn sign_in_errors_map_to_alert_text() {
        let alert = ErrorAlert::from(SignInError::ScopesMissing);
        assert!(alert.message.contains("Editing is disabled."));
        assert_eq!(
            ErrorAlert::from(SignInError::UserMissing).message,
            "User authentication failed."
        );
    }
}
