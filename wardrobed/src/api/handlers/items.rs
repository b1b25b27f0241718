use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};

use crate::AppState;
use crate::api::handlers::forms::{UploadedFile, collect_form};
use crate::api::handlers::media::discard_blob;
use crate::api::models::items::{ItemDeleteResponse, ItemListResponse, ItemUploadResponse, ListItemsQuery};
use crate::db::WardrobeItemCreate;
use crate::errors::{Error, Result};
use crate::gateway::normalize::{DEFAULT_CATEGORY, category_label};
use crate::storage::{StoredImage, object_path};
use crate::types::ItemId;

/// Upload a garment image, classify it, and record it in the wardrobe.
///
/// Classification is best-effort: when the gateway cannot be reached or
/// produces nothing usable, the item is stored under the default category
/// instead of failing the upload. A metadata insert failure rolls back the
/// blob written earlier in this request before reporting the original error.
pub async fn upload_item(State(state): State<AppState>, multipart: Multipart) -> Result<Json<ItemUploadResponse>> {
    let mut form = collect_form(multipart).await?;
    let image = form.take_file("image")?;
    let user_id = form.take_text("user_id")?;

    let path = object_path(&user_id, &image.filename);
    state.blobs.upload(&path, &image.content_type, image.bytes.clone()).await?;
    let stored = StoredImage {
        url: state.blobs.public_url(&path),
        path,
    };

    let category = classify(&state, &image).await;

    let create = WardrobeItemCreate {
        user_id,
        image_url: stored.url.clone(),
        category,
    };
    let item = match state.store.insert_item(&create).await {
        Ok(item) => item,
        Err(e) => {
            discard_blob(state.blobs.as_ref(), &stored).await;
            return Err(e.into());
        }
    };

    tracing::info!(item_id = %item.id, category = %item.category, "wardrobe item stored");

    Ok(Json(ItemUploadResponse {
        success: true,
        id: item.id,
        image_url: item.image_url,
        category: item.category,
    }))
}

/// Classifier call with the degraded-success fallback
async fn classify(state: &AppState, image: &UploadedFile) -> String {
    match classify_via_gateway(state, image).await {
        Ok(label) => label,
        Err(e) => {
            tracing::warn!(error = %e, "classification unavailable, falling back to default category");
            DEFAULT_CATEGORY.to_string()
        }
    }
}

async fn classify_via_gateway(state: &AppState, image: &UploadedFile) -> crate::gateway::Result<String> {
    let session = state.gateway.connect(&state.config.gateway.classifier).await?;
    let result = session.invoke(crate::gateway::GatewayInputs::new().push("image", image.to_gateway_value())).await?;
    Ok(category_label(result.first()))
}

/// List one owner's wardrobe items, newest first
pub async fn list_items(State(state): State<AppState>, Query(query): Query<ListItemsQuery>) -> Result<Json<ItemListResponse>> {
    let user_id = query.user_id.ok_or_else(|| Error::Validation {
        message: "Missing required query parameter: 'user_id'".to_string(),
    })?;

    let items = state.store.list_items(&user_id).await?;
    Ok(Json(ItemListResponse { success: true, items }))
}

/// Delete a wardrobe item and, best-effort, its stored blob.
///
/// The record delete is authoritative; a blob that cannot be removed
/// afterwards is logged and left behind.
pub async fn delete_item(State(state): State<AppState>, Path(item_id): Path<String>) -> Result<Json<ItemDeleteResponse>> {
    let item_id = item_id.parse::<ItemId>().map_err(|_| Error::Validation {
        message: "Invalid item ID format".to_string(),
    })?;

    let item = state.store.get_item(item_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Item".to_string(),
        id: item_id.to_string(),
    })?;

    if !state.store.delete_item(item_id).await? {
        return Err(Error::NotFound {
            resource: "Item".to_string(),
            id: item_id.to_string(),
        });
    }

    match state.blobs.blob_path(&item.image_url) {
        Some(path) => {
            if let Err(e) = state.blobs.delete(&path).await {
                tracing::warn!(path = %path, error = %e, "failed to delete blob for removed item");
            }
        }
        None => {
            tracing::debug!(url = %item.image_url, "stored URL does not map to a blob path, skipping blob delete");
        }
    }

    Ok(Json(ItemDeleteResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::WardrobeStore;
    use crate::storage::{self, BlobStore, MemoryBlobStore, StorageError};
    use crate::test_utils::{FailingStore, TEST_IMAGE, gateway_config, memory_state, spawn_app, state_with, test_config};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use bytes::Bytes;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Blob store whose deletes fail while everything else works
    struct FailingDeleteBlobs {
        inner: MemoryBlobStore,
    }

    #[async_trait]
    impl BlobStore for FailingDeleteBlobs {
        async fn upload(&self, path: &str, content_type: &str, bytes: Bytes) -> storage::Result<()> {
            self.inner.upload(path, content_type, bytes).await
        }

        fn public_url(&self, path: &str) -> String {
            self.inner.public_url(path)
        }

        async fn delete(&self, path: &str) -> storage::Result<()> {
            Err(StorageError::Delete {
                path: path.to_string(),
                message: "delete disabled".to_string(),
            })
        }

        fn blob_path(&self, url: &str) -> Option<String> {
            self.inner.blob_path(url)
        }
    }

    async fn mount_classifier(server: &MockServer, label: Value) {
        Mock::given(method("GET"))
            .and(path("/info"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/run/classify_garment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [label] })))
            .mount(server)
            .await;
    }

    fn upload_form(user_id: Option<&str>) -> MultipartForm {
        let mut form = MultipartForm::new().add_part("image", Part::bytes(TEST_IMAGE).file_name("shirt.png"));
        if let Some(user_id) = user_id {
            form = form.add_text("user_id", user_id);
        }
        form
    }

    #[tokio::test]
    async fn upload_stores_classifies_and_records() {
        let gateway = MockServer::start().await;
        mount_classifier(&gateway, json!("Shirt")).await;

        let (state, blobs, store) = memory_state(gateway_config(&gateway.uri()));
        let server = spawn_app(state);

        let response = server.post("/api/v1/items").multipart(upload_form(Some("u1"))).await;
        response.assert_status_ok();

        let body: ItemUploadResponse = response.json();
        assert!(body.success);
        // Labels are lowercased before persistence
        assert_eq!(body.category, "shirt");
        assert!(body.image_url.starts_with("memory://wardrobe/u1/"), "owner-namespaced: {}", body.image_url);
        assert!(body.image_url.ends_with(".png"));

        let paths = blobs.paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(blobs.contents(&paths[0]).unwrap().bytes.as_ref(), TEST_IMAGE);

        let items = store.list_items("u1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, body.id);
        assert_eq!(items[0].category, "shirt");
    }

    #[tokio::test]
    async fn upload_without_user_id_is_rejected_before_any_write() {
        let (state, blobs, store) = memory_state(test_config());
        let server = spawn_app(state);

        let response = server.post("/api/v1/items").multipart(upload_form(None)).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        assert!(blobs.is_empty(), "validation failures must not store blobs");
        assert!(store.list_items("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_with_empty_image_is_rejected() {
        let (state, blobs, _store) = memory_state(test_config());
        let server = spawn_app(state);

        let form = MultipartForm::new()
            .add_part("image", Part::bytes(Vec::new()).file_name("empty.png"))
            .add_text("user_id", "u1");
        let response = server.post("/api/v1/items").multipart(form).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn unreachable_classifier_degrades_to_default_category() {
        // No mocks mounted: the handshake gets a 404 and connect fails
        let gateway = MockServer::start().await;

        let (state, blobs, store) = memory_state(gateway_config(&gateway.uri()));
        let server = spawn_app(state);

        let response = server.post("/api/v1/items").multipart(upload_form(Some("u1"))).await;
        response.assert_status_ok();

        let body: ItemUploadResponse = response.json();
        assert_eq!(body.category, DEFAULT_CATEGORY);
        assert_eq!(blobs.paths().len(), 1, "upload must survive classifier loss");
        assert_eq!(store.list_items("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unusable_classifier_output_degrades_to_default_category() {
        let gateway = MockServer::start().await;
        mount_classifier(&gateway, json!({ "confidence": 0.4 })).await;

        let (state, _blobs, _store) = memory_state(gateway_config(&gateway.uri()));
        let server = spawn_app(state);

        let response = server.post("/api/v1/items").multipart(upload_form(Some("u1"))).await;
        response.assert_status_ok();
        assert_eq!(response.json::<ItemUploadResponse>().category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_the_stored_blob_exactly_once() {
        let gateway = MockServer::start().await;
        mount_classifier(&gateway, json!("Shirt")).await;

        let blobs = Arc::new(MemoryBlobStore::new("memory://wardrobe"));
        let state = state_with(gateway_config(&gateway.uri()), blobs.clone(), Arc::new(FailingStore));
        let server = spawn_app(state);

        let response = server.post("/api/v1/items").multipart(upload_form(Some("u1"))).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["error"], "Database error occurred");

        let deletes = blobs.delete_calls();
        assert_eq!(deletes.len(), 1, "compensating delete must run exactly once");
        assert!(deletes[0].starts_with("u1/"));
        assert!(blobs.is_empty(), "the stored blob must be gone");
    }

    #[tokio::test]
    async fn failed_rollback_still_reports_the_original_error() {
        let gateway = MockServer::start().await;
        mount_classifier(&gateway, json!("Shirt")).await;

        let blobs = Arc::new(FailingDeleteBlobs {
            inner: MemoryBlobStore::new("memory://wardrobe"),
        });
        let state = state_with(gateway_config(&gateway.uri()), blobs.clone(), Arc::new(FailingStore));
        let server = spawn_app(state);

        let response = server.post("/api/v1/items").multipart(upload_form(Some("u1"))).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        // The delete failure is swallowed; the insert failure is what the caller sees
        assert_eq!(response.json::<Value>()["error"], "Database error occurred");
        assert!(!blobs.inner.is_empty(), "blob survives when the rollback delete fails");
    }

    #[tokio::test]
    async fn list_requires_user_id() {
        let (state, _blobs, _store) = memory_state(test_config());
        let server = spawn_app(state);

        let response = server.get("/api/v1/items").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_is_scoped_and_newest_first() {
        let (state, _blobs, store) = memory_state(test_config());

        let first = store
            .insert_item(&WardrobeItemCreate {
                user_id: "u1".to_string(),
                image_url: "memory://wardrobe/u1/a.png".to_string(),
                category: "shirt".to_string(),
            })
            .await
            .unwrap();
        let second = store
            .insert_item(&WardrobeItemCreate {
                user_id: "u1".to_string(),
                image_url: "memory://wardrobe/u1/b.png".to_string(),
                category: "pants".to_string(),
            })
            .await
            .unwrap();
        store
            .insert_item(&WardrobeItemCreate {
                user_id: "u2".to_string(),
                image_url: "memory://wardrobe/u2/c.png".to_string(),
                category: "dress".to_string(),
            })
            .await
            .unwrap();

        let server = spawn_app(state);
        let response = server.get("/api/v1/items?user_id=u1").await;
        response.assert_status_ok();

        let body: ItemListResponse = response.json();
        assert!(body.success);
        let ids: Vec<_> = body.items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn delete_removes_record_and_blob() {
        let (state, blobs, store) = memory_state(test_config());

        blobs
            .upload("u9/pic.png", "image/png", Bytes::from_static(TEST_IMAGE))
            .await
            .unwrap();
        let item = store
            .insert_item(&WardrobeItemCreate {
                user_id: "u9".to_string(),
                image_url: blobs.public_url("u9/pic.png"),
                category: "shirt".to_string(),
            })
            .await
            .unwrap();

        let server = spawn_app(state);
        let response = server.delete(&format!("/api/v1/items/{}", item.id)).await;
        response.assert_status_ok();
        assert!(response.json::<ItemDeleteResponse>().success);

        assert!(store.list_items("u9").await.unwrap().is_empty());
        assert!(blobs.is_empty(), "blob should be cleaned up with the record");
    }

    #[tokio::test]
    async fn delete_of_unknown_item_is_not_found() {
        let (state, _blobs, _store) = memory_state(test_config());
        let server = spawn_app(state);

        let response = server.delete(&format!("/api/v1/items/{}", uuid::Uuid::new_v4())).await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_with_malformed_id_is_rejected() {
        let (state, _blobs, _store) = memory_state(test_config());
        let server = spawn_app(state);

        let response = server.delete("/api/v1/items/not-a-uuid").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
