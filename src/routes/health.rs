use actix_web::{get, HttpResponse};
use serde_json::json;

#[get("/ready")]
pub async fn ready() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ready"}))
}

#[get("/lively")]
pub async fn lively() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "alive"}))
}
