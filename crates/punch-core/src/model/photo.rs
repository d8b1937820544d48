//! Completed-photo evidence attached to a deficiency.

use serde::{Deserialize, Serialize};

/// One photo captured as completion evidence.
///
/// The `start_date` ties the photo to the remediation window it was taken
/// in: a pending deficiency may only complete on evidence from its current
/// window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPhoto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Client-facing download reference.
    pub download_url: String,
    /// Storage-layer reference used by the (external) cleanup job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<String>,
    #[serde(default, deserialize_with = "crate::time::lenient_seconds")]
    pub created_at: i64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "crate::time::lenient_seconds_opt"
    )]
    pub start_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}
