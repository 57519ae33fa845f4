use crate::models::message::ErrorResponse;
use rocket::serde::json::Json;
use rocket::{Request, catch};

fn error(message: &str) -> Json<ErrorResponse> {
    Json(ErrorResponse {
        error: message.to_string(),
    })
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorResponse> {
    error("Bad request")
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ErrorResponse> {
    error("Access denied")
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorResponse> {
    error("Not found")
}

#[catch(413)]
pub fn payload_too_large(_: &Request) -> Json<ErrorResponse> {
    error("Payload too large")
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorResponse> {
    error("Bad request")
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorResponse> {
    error("Internal server error")
}

pub fn catchers() -> Vec<rocket::Catcher> {
    rocket::catchers![bad_request, unauthorized, not_found, payload_too_large, unprocessable_entity, internal_error]
}
