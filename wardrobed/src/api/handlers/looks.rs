use axum::{Json, extract::State};

use crate::AppState;
use crate::api::handlers::media::{discard_blob, extension_from_url, fetch_image};
use crate::api::models::looks::{LookListResponse, LookResponse, SaveLookRequest, SavedLook};
use crate::auth::AuthenticatedUser;
use crate::db::StyledLookCreate;
use crate::errors::{Error, Result};
use crate::storage::{StoredImage, object_path};

/// Save a generated outfit image as a styled look owned by the caller.
///
/// The image usually lives on the inference host and is re-fetched into our
/// own blob store so it outlives that host. Unlike item classification, a
/// fetch failure here is fatal: there is nothing to save without the bytes.
/// A metadata insert failure rolls back the freshly stored blob.
pub async fn save_look(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<SaveLookRequest>,
) -> Result<Json<LookResponse>> {
    let image_url = match request.image_url.as_deref() {
        Some(url) if !url.trim().is_empty() => url,
        _ => {
            return Err(Error::Validation {
                message: "Missing required field: 'image_url'".to_string(),
            });
        }
    };

    let (bytes, content_type) = fetch_image(&state.http, image_url).await?;
    let extension = extension_from_url(image_url);
    let content_type = content_type
        .unwrap_or_else(|| mime_guess::from_ext(extension).first_or_octet_stream().essence_str().to_string());

    let path = object_path(&user.id, &format!("look.{extension}"));
    state.blobs.upload(&path, &content_type, bytes).await?;
    let stored = StoredImage {
        url: state.blobs.public_url(&path),
        path,
    };

    let create = StyledLookCreate {
        user_id: user.id,
        image_url: stored.url.clone(),
        params: request.parameters.unwrap_or_default(),
    };
    let look = match state.store.insert_look(&create).await {
        Ok(look) => look,
        Err(e) => {
            discard_blob(state.blobs.as_ref(), &stored).await;
            return Err(e.into());
        }
    };

    tracing::info!(look_id = %look.id, user_id = %look.user_id, "styled look saved");

    Ok(Json(LookResponse {
        success: true,
        data: SavedLook {
            id: look.id,
            image_url: look.image_url,
            created_at: look.created_at,
        },
    }))
}

/// List the caller's saved looks, newest first
pub async fn list_looks(State(state): State<AppState>, user: AuthenticatedUser) -> Result<Json<LookListResponse>> {
    let looks = state.store.list_looks(&user.id).await?;
    Ok(Json(LookListResponse { success: true, looks }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{LookParams, WardrobeStore};
    use crate::storage::MemoryBlobStore;
    use crate::test_utils::{FailingStore, bearer_header, memory_state, mint_token, spawn_app, state_with, test_config};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_source_image(server: &MockServer, source_path: &str, content_type: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(source_path))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_vec(), content_type))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn saving_requires_authentication() {
        let (state, blobs, _store) = memory_state(test_config());
        let server = spawn_app(state);

        let body = json!({ "image_url": "https://cdn.example.com/look.png" });

        let response = server.post("/api/v1/looks").json(&body).await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        let (name, value) = bearer_header("not-a-real-token");
        let response = server.post("/api/v1/looks").add_header(name, value).json(&body).await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        assert!(blobs.is_empty(), "rejected requests must not store blobs");
    }

    #[tokio::test]
    async fn saves_a_fetched_look_for_the_caller() {
        let source = MockServer::start().await;
        mount_source_image(&source, "/styled/abc.png", "image/png", b"styled-bytes").await;

        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let (state, blobs, store) = memory_state(config);
        let server = spawn_app(state);

        let (name, value) = bearer_header(&token);
        let response = server
            .post("/api/v1/looks")
            .add_header(name, value)
            .json(&json!({
                "image_url": format!("{}/styled/abc.png", source.uri()),
                "parameters": { "occasion": "wedding", "style": "classic" },
            }))
            .await;
        response.assert_status_ok();

        let body: LookResponse = response.json();
        assert!(body.success);
        assert!(body.data.image_url.starts_with("memory://wardrobe/user-9/"), "owner-namespaced: {}", body.data.image_url);
        assert!(body.data.image_url.ends_with(".png"));

        let paths = blobs.paths();
        assert_eq!(paths.len(), 1);
        let blob = blobs.contents(&paths[0]).unwrap();
        assert_eq!(blob.bytes.as_ref(), b"styled-bytes");
        assert_eq!(blob.content_type, "image/png");

        let looks = store.list_looks("user-9").await.unwrap();
        assert_eq!(looks.len(), 1);
        assert_eq!(looks[0].id, body.data.id);
        assert_eq!(looks[0].params.occasion.as_deref(), Some("wedding"));
        assert_eq!(looks[0].params.style.as_deref(), Some("classic"));
        assert_eq!(looks[0].params.weather, None);
    }

    #[tokio::test]
    async fn parameters_are_optional() {
        let source = MockServer::start().await;
        mount_source_image(&source, "/styled/plain.png", "image/png", b"plain").await;

        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let (state, _blobs, store) = memory_state(config);
        let server = spawn_app(state);

        let (name, value) = bearer_header(&token);
        let response = server
            .post("/api/v1/looks")
            .add_header(name, value)
            .json(&json!({ "image_url": format!("{}/styled/plain.png", source.uri()) }))
            .await;
        response.assert_status_ok();

        let looks = store.list_looks("user-9").await.unwrap();
        assert_eq!(looks[0].params.occasion, None);
    }

    #[tokio::test]
    async fn suffixless_source_urls_default_to_jpg() {
        let source = MockServer::start().await;
        mount_source_image(&source, "/render", "image/jpeg", b"jpeg-bytes").await;

        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let (state, blobs, _store) = memory_state(config);
        let server = spawn_app(state);

        let (name, value) = bearer_header(&token);
        let response = server
            .post("/api/v1/looks")
            .add_header(name, value)
            .json(&json!({ "image_url": format!("{}/render", source.uri()) }))
            .await;
        response.assert_status_ok();

        assert!(blobs.paths()[0].ends_with(".jpg"));
    }

    #[tokio::test]
    async fn missing_image_url_is_rejected() {
        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let (state, blobs, _store) = memory_state(config);
        let server = spawn_app(state);

        let (name, value) = bearer_header(&token);
        let response = server.post("/api/v1/looks").add_header(name, value).json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "Missing required field: 'image_url'");
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn unfetchable_source_is_a_server_error() {
        // Nothing mounted: the source answers 404
        let source = MockServer::start().await;

        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let (state, blobs, store) = memory_state(config);
        let server = spawn_app(state);

        let (name, value) = bearer_header(&token);
        let response = server
            .post("/api/v1/looks")
            .add_header(name, value)
            .json(&json!({ "image_url": format!("{}/styled/gone.png", source.uri()) }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["error"], "Failed to fetch image");
        assert!(blobs.is_empty(), "nothing may be stored when the fetch fails");
        assert!(store.list_looks("user-9").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_insert_rolls_back_the_stored_blob() {
        let source = MockServer::start().await;
        mount_source_image(&source, "/styled/abc.png", "image/png", b"styled-bytes").await;

        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let blobs = Arc::new(MemoryBlobStore::new("memory://wardrobe"));
        let state = state_with(config, blobs.clone(), Arc::new(FailingStore));
        let server = spawn_app(state);

        let (name, value) = bearer_header(&token);
        let response = server
            .post("/api/v1/looks")
            .add_header(name, value)
            .json(&json!({ "image_url": format!("{}/styled/abc.png", source.uri()) }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.json::<Value>()["error"], "Database error occurred");

        let deletes = blobs.delete_calls();
        assert_eq!(deletes.len(), 1, "compensating delete must run exactly once");
        assert!(deletes[0].starts_with("user-9/"));
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn lists_only_the_callers_looks_newest_first() {
        let config = test_config();
        let token = mint_token("user-9", None, &config);
        let (state, _blobs, store) = memory_state(config);

        let first = store
            .insert_look(&StyledLookCreate {
                user_id: "user-9".to_string(),
                image_url: "memory://wardrobe/user-9/a.png".to_string(),
                params: LookParams::default(),
            })
            .await
            .unwrap();
        let second = store
            .insert_look(&StyledLookCreate {
                user_id: "user-9".to_string(),
                image_url: "memory://wardrobe/user-9/b.png".to_string(),
                params: LookParams {
                    occasion: Some("brunch".to_string()),
                    ..LookParams::default()
                },
            })
            .await
            .unwrap();
        store
            .insert_look(&StyledLookCreate {
                user_id: "someone-else".to_string(),
                image_url: "memory://wardrobe/someone-else/c.png".to_string(),
                params: LookParams::default(),
            })
            .await
            .unwrap();

        let server = spawn_app(state);
        let (name, value) = bearer_header(&token);
        let response = server.get("/api/v1/looks").add_header(name, value).await;
        response.assert_status_ok();

        let body: LookListResponse = response.json();
        assert!(body.success);
        let ids: Vec<_> = body.looks.iter().map(|look| look.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn listing_requires_authentication() {
        let (state, _blobs, _store) = memory_state(test_config());
        let server = spawn_app(state);

        let response = server.get("/api/v1/looks").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
