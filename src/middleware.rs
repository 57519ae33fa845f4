use crate::auth::SessionUser;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::Request;
use rocket::{Data, Response};
use tracing::{info, warn};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Correlation id of a request; stored in the request-local cache.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn of(request: &Request<'_>) -> Option<String> {
        request.local_cache(|| None::<RequestId>).as_ref().map(|id| id.0.clone())
    }
}

/// Tags each request with a fresh id and writes one access log line per
/// request and response. Device traffic is logged under the device routes'
/// URIs; operator traffic additionally carries the session login.
pub struct AccessLog;

#[rocket::async_trait]
impl Fairing for AccessLog {
    fn info(&self) -> Info {
        Info {
            name: "Access Log",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let id = RequestId(Uuid::new_v4().to_string());
        request.local_cache(|| Some(id.clone()));

        info!(request_id = %id.0, method = %request.method(), uri = %request.uri(), "incoming request");
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = RequestId::of(request).unwrap_or_else(|| "unknown".to_string());
        let login = request
            .local_cache(|| None::<SessionUser>)
            .as_ref()
            .map(|user| user.login.clone())
            .unwrap_or_default();

        response.set_header(Header::new(REQUEST_ID_HEADER, request_id.clone()));
        response.set_header(Header::new("X-Content-Type-Options", "nosniff"));

        let status = response.status();
        if status.class().is_client_error() || status.class().is_server_error() {
            warn!(
                request_id = %request_id,
                login = %login,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                "request completed with error"
            );
        } else {
            info!(
                request_id = %request_id,
                login = %login,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                "request completed"
            );
        }
    }
}
