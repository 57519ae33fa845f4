use crate::config::Config;
use crate::crypto::password::constant_time_eq;
use crate::error::app_error::AppError;
use crate::session::{SESSION_COOKIE, SessionManager};
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use serde::Serialize;
use tracing::{info, warn};

pub const API_KEY_HEADER: &str = "Api-Key";

/// Proof that the request carried the configured device API key.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

pub(crate) fn check_api_key(supplied: Option<&str>, expected: &str) -> Result<(), AppError> {
    match supplied {
        None | Some("") => {
            info!("No api key");
            Err(AppError::Unauthorized)
        }
        Some(key) if !expected.is_empty() && constant_time_eq(key.as_bytes(), expected.as_bytes()) => Ok(()),
        Some(_) => {
            warn!("Wrong api key");
            Err(AppError::Unauthorized)
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ApiKey {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let config = match req.rocket().state::<Config>() {
            Some(config) => config,
            None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
        };

        match check_api_key(req.headers().get_one(API_KEY_HEADER), &config.api.key) {
            Ok(()) => Outcome::Success(ApiKey),
            Err(err) => Outcome::Error((Status::Unauthorized, err)),
        }
    }
}

/// The operator behind a valid session cookie. Resolving it refreshes the
/// session: a new cookie is set on the response and the stored expiry moves
/// forward.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub login: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let sessions = match req.rocket().state::<SessionManager>() {
            Some(sessions) => sessions,
            None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
        };

        let cookies = req.cookies();
        let Some(token) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            info!("No session cookie");
            return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
        };

        match sessions.validate(&token).await {
            Ok(session) => {
                cookies.add(sessions.cookie(&session));
                let user = SessionUser { login: session.login };
                req.local_cache(|| Some(user.clone()));
                Outcome::Success(user)
            }
            Err(err) => {
                let status = Status::from(&err);
                warn!(error = %err, status = %status.code, "Session rejected");
                Outcome::Error((status, err))
            }
        }
    }
}
