use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{LookParams, StyledLook};
use crate::types::LookId;

/// Request body for saving a styled look.
///
/// `image_url` points at an image produced by an earlier step (usually a
/// try-on run). The parameter bag is free-form styling context; unknown keys
/// are dropped silently.
#[derive(Debug, Deserialize)]
pub struct SaveLookRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub parameters: Option<LookParams>,
}

/// The persisted look as returned to the caller
#[derive(Debug, Serialize, Deserialize)]
pub struct SavedLook {
    pub id: LookId,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

/// Response for saving a styled look
#[derive(Debug, Serialize, Deserialize)]
pub struct LookResponse {
    pub success: bool,
    pub data: SavedLook,
}

/// Response for listing the authenticated owner's looks, newest first
#[derive(Debug, Serialize, Deserialize)]
pub struct LookListResponse {
    pub success: bool,
    pub looks: Vec<StyledLook>,
}
