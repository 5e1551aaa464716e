use crate::db::Stores;
use actix_web::{web, HttpResponse, Result as ActixResult};
use serde_json::json;

/// Health check endpoint, including mirror reachability
/// GET /health
pub async fn health(stores: web::Data<Stores>) -> ActixResult<HttpResponse> {
    let mirror = stores.mirror_status().await;
    Ok(HttpResponse::Ok().json(json!({
        "status": "ok",
        "mirror": mirror.as_str()
    })))
}
