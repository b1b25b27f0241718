use axum::Json;
use serde_json::{Value, json};

/// Liveness probe. Deliberately checks nothing downstream: the service being
/// able to answer is the signal.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
