use crate::auth::ApiKey;
use crate::config::Config;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::device::{ErrorReportRequest, RegisterDeviceRequest};
use crate::models::message::MessageResponse;
use chrono::Utc;
use rocket::fs::NamedFile;
use rocket::serde::json::Json;
use rocket::{State, routes};
use tracing::{info, warn};

/// Register a device, or refresh the registration date of a known one.
#[rocket::post("/register", data = "<payload>")]
pub async fn register_device(
    repo: &State<SharedRepository>,
    _api_key: ApiKey,
    payload: JsonBody<RegisterDeviceRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    repo.upsert_device(&payload.device_number, Utc::now()).await?;
    info!(device_number = %payload.device_number, "device registered");
    Ok(Json(MessageResponse::new("Device registered")))
}

/// Record an error reported by a registered device.
#[rocket::post("/error", data = "<payload>")]
pub async fn report_error(
    repo: &State<SharedRepository>,
    _api_key: ApiKey,
    payload: JsonBody<ErrorReportRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let error = repo.insert_error(&payload, Utc::now()).await?;
    info!(device_number = %error.device_number, error_name = %error.error_name, "device error registered");
    Ok(Json(MessageResponse::new("Error registered")))
}

#[rocket::get("/firmware")]
pub async fn firmware(config: &State<Config>, _api_key: ApiKey) -> Option<NamedFile> {
    match NamedFile::open(&config.firmware.path).await {
        Ok(file) => Some(file),
        Err(err) => {
            warn!(path = %config.firmware.path, error = %err, "firmware image unavailable");
            None
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register_device, report_error, firmware]
}
