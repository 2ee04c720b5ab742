//! API query and error types.

use serde::{Deserialize, Serialize};

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Message shown inline to the user.
    pub error: String,
}

/// Query parameters for `GET /view`.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Building to open; absent means the landing view.
    pub building: Option<String>,
}
