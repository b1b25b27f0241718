use serde::{Deserialize, Serialize};

use crate::db::WardrobeItem;
use crate::types::ItemId;

/// Response for a categorized upload
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemUploadResponse {
    pub success: bool,
    pub id: ItemId,
    pub image_url: String,
    pub category: String,
}

/// Query parameters for listing wardrobe items
#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub user_id: Option<String>,
}

/// Response for listing wardrobe items, newest first
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub success: bool,
    pub items: Vec<WardrobeItem>,
}

/// Response for deleting a wardrobe item
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemDeleteResponse {
    pub success: bool,
}
