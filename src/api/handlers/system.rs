use axum::Json;
use serde_json::{json, Value};

/// Handler for GET / - Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "CuraLink API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Handler for GET /health - Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let value = health_check().await.0;
        assert_eq!(value, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_root_banner() {
        let value = root().await.0;
        assert_eq!(value["message"], "CuraLink API is running");
        assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    }
}
