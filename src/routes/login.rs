use crate::crypto::password::{dummy_verify, verify_password};
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::credentials::LoginRequest;
use crate::models::message::MessageResponse;
use crate::session::SessionManager;
use rocket::http::CookieJar;
use rocket::serde::json::Json;
use rocket::{State, routes};
use tracing::{info, warn};

/// Exchange the admin login and password for a session cookie.
///
/// Every failure answers 401 and leaves the cookie jar untouched.
#[rocket::post("/login", data = "<payload>")]
pub async fn post_login(
    repo: &State<SharedRepository>,
    sessions: &State<SessionManager>,
    cookies: &CookieJar<'_>,
    payload: JsonBody<LoginRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let credentials = match repo.get_credentials(&payload.login).await {
        Ok(credentials) => credentials,
        Err(AppError::NotFound(_)) => {
            dummy_verify(&payload.password);
            warn!(login = %payload.login, "login for unknown user");
            return Err(AppError::InvalidCredentials);
        }
        Err(err) => return Err(err),
    };

    if credentials.login != payload.login || !verify_password(&payload.password, &credentials.password_hash) {
        warn!(login = %payload.login, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let session = sessions.issue(&credentials.login).await?;
    cookies.add(sessions.cookie(&session));
    info!(login = %session.login, expires_at = %session.expires_at, "operator logged in");

    Ok(Json(MessageResponse::new("ok")))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![post_login]
}
