use crate::models::health::HealthResponse;
use rocket::routes;
use rocket::serde::json::Json;

#[rocket::get("/")]
pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![healthcheck]
}
