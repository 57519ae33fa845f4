use crate::error::app_error::AppError;
use rocket::data::{ByteUnit, Data, FromData, Outcome};
use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::serde_json;
use serde::de::DeserializeOwned;
use std::ops::Deref;
use tracing::warn;
use validator::Validate;

/// JSON request body that is deserialized and then validated.
///
/// Unlike Rocket's built-in `Json`, malformed and invalid payloads both end in
/// 400 and the parse failure is logged with its position. The body itself is
/// never logged since login payloads carry passwords.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> Deref for JsonBody<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T: DeserializeOwned + Validate> FromData<'r> for JsonBody<T> {
    type Error = AppError;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        let limit = req.limits().get("json").unwrap_or(ByteUnit::Mebibyte(1));

        let bytes = match data.open(limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                warn!(method = %req.method(), uri = %req.uri(), "JSON payload exceeded size limit");
                return Outcome::Error((Status::PayloadTooLarge, AppError::BadRequest("payload too large".to_string())));
            }
            Err(e) => {
                warn!(method = %req.method(), uri = %req.uri(), error = %e, "Failed to read request body");
                return Outcome::Error((Status::BadRequest, AppError::BadRequest(e.to_string())));
            }
        };

        let value = match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    error_line = e.line(),
                    error_column = e.column(),
                    error_category = ?e.classify(),
                    "Failed to parse JSON request body"
                );
                return Outcome::Error((Status::BadRequest, AppError::BadRequest(e.to_string())));
            }
        };

        if let Err(errors) = value.validate() {
            warn!(method = %req.method(), uri = %req.uri(), errors = %errors, "Request body failed validation");
            return Outcome::Error((Status::BadRequest, AppError::ValidationError(errors)));
        }

        Outcome::Success(JsonBody(value))
    }
}
