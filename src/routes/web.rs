use crate::auth::SessionUser;
use crate::database::SharedRepository;
use crate::database::device::DeviceRepository;
use crate::error::app_error::AppError;
use crate::models::device::DeviceList;
use rocket::serde::json::Json;
use rocket::{State, routes};
use tracing::debug;

fn parse_bound(name: &str, raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(AppError::BadRequest(format!("Invalid {}: {}", name, raw))),
    }
}

/// One page of registered devices with their reported errors, plus the total
/// number of devices in the store.
#[rocket::get("/list/<skip>/<limit>")]
pub async fn list_devices(
    repo: &State<SharedRepository>,
    user: SessionUser,
    skip: &str,
    limit: &str,
) -> Result<Json<DeviceList>, AppError> {
    let skip = parse_bound("skip", skip)?;
    let limit = parse_bound("limit", limit)?;

    let devices = repo.list_devices(skip, limit).await?;
    let total = repo.count_devices().await?;
    debug!(login = %user.login, skip, limit, returned = devices.len(), total, "listed devices");

    Ok(Json(DeviceList { devices, total }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![list_devices]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_rocket;
    use crate::database::cookie_expiry::CookieExpiryRepository;
    use crate::database::device_error::DeviceErrorRepository;
    use crate::models::device::ErrorReportRequest;
    use crate::session::{SESSION_COOKIE, SessionManager};
    use crate::test_utils::{InMemoryRepository, TEST_LOGIN, test_app};
    use chrono::{Duration, Utc};
    use rocket::http::{Cookie, Status};
    use rocket::local::asynchronous::Client;
    use std::sync::Arc;

    async fn logged_in_client(repo: Arc<InMemoryRepository>) -> (Client, Cookie<'static>) {
        let (config, shared, sessions) = test_app(repo);
        let session = sessions.issue(TEST_LOGIN).await.unwrap();
        let cookie = sessions.cookie(&session);
        let client = Client::untracked(build_rocket(config, shared, sessions)).await.expect("valid rocket instance");
        (client, cookie)
    }

    #[test]
    fn bounds_must_be_non_negative_integers() {
        assert_eq!(parse_bound("skip", "0").unwrap(), 0);
        assert_eq!(parse_bound("limit", "25").unwrap(), 25);
        assert!(matches!(parse_bound("skip", "-1"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_bound("skip", "abc"), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_bound("limit", "1.5"), Err(AppError::BadRequest(_))));
    }

    #[rocket::async_test]
    async fn lists_devices_with_their_errors() {
        let repo = Arc::new(InMemoryRepository::default());
        repo.upsert_device("1", Utc::now()).await.unwrap();
        repo.upsert_device("2", Utc::now()).await.unwrap();
        let report = ErrorReportRequest {
            error_name: "electricity".to_string(),
            device_number: "2".to_string(),
        };
        repo.insert_error(&report, Utc::now()).await.unwrap();
        let (client, cookie) = logged_in_client(repo).await;

        let response = client.get("/web/list/0/10").cookie(cookie).dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let list: DeviceList = response.into_json().await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.devices.len(), 2);
        assert_eq!(list.devices[0].device_number, "1");
        assert!(list.devices[0].errors.is_empty());
        assert_eq!(list.devices[1].errors.len(), 1);
        assert_eq!(list.devices[1].errors[0].error_name, "electricity");
    }

    #[rocket::async_test]
    async fn pagination_limits_page_but_not_total() {
        let repo = Arc::new(InMemoryRepository::default());
        for number in ["a", "b", "c"] {
            repo.upsert_device(number, Utc::now()).await.unwrap();
        }
        let (client, cookie) = logged_in_client(repo).await;

        let response = client.get("/web/list/1/1").cookie(cookie).dispatch().await;

        let list: DeviceList = response.into_json().await.unwrap();
        assert_eq!(list.total, 3);
        assert_eq!(list.devices.len(), 1);
        assert_eq!(list.devices[0].device_number, "b");
    }

    #[rocket::async_test]
    async fn non_numeric_bounds_are_a_bad_request() {
        let (client, cookie) = logged_in_client(Arc::new(InMemoryRepository::default())).await;

        let response = client.get("/web/list/abc/10").cookie(cookie.clone()).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = client.get("/web/list/0/-5").cookie(cookie).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn missing_cookie_is_unauthorized() {
        let (client, _cookie) = logged_in_client(Arc::new(InMemoryRepository::default())).await;

        let response = client.get("/web/list/0/10").dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(response.into_string().await.unwrap(), r#"{"error":"Access denied"}"#);
    }

    #[rocket::async_test]
    async fn tampered_cookie_is_unauthorized() {
        let (client, _cookie) = logged_in_client(Arc::new(InMemoryRepository::default())).await;

        let response = client
            .get("/web/list/0/10")
            .cookie(Cookie::new(SESSION_COOKIE, "1700000000.AAAA.AAAA"))
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn valid_session_is_refreshed() {
        let repo = Arc::new(InMemoryRepository::default());
        let (client, cookie) = logged_in_client(repo.clone()).await;
        let expiry_before = repo.get_cookie_expiry(TEST_LOGIN).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let response = client.get("/web/list/0/10").cookie(cookie.clone()).dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let refreshed = response.cookies().get(SESSION_COOKIE).expect("refreshed cookie").clone();
        assert_ne!(refreshed.value(), cookie.value());
        let sessions = client.rocket().state::<SessionManager>().expect("session manager");
        assert_eq!(sessions.decode(refreshed.value()).unwrap().login, TEST_LOGIN);
        assert!(repo.get_cookie_expiry(TEST_LOGIN).await.unwrap() > expiry_before);
    }

    #[rocket::async_test]
    async fn passed_server_side_expiry_is_unauthorized() {
        let repo = Arc::new(InMemoryRepository::default());
        let (client, cookie) = logged_in_client(repo.clone()).await;
        repo.set_cookie_expiry(TEST_LOGIN, Utc::now() - Duration::minutes(1)).await.unwrap();

        let response = client.get("/web/list/0/10").cookie(cookie).dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
        assert!(response.cookies().get(SESSION_COOKIE).is_none());
    }

    #[rocket::async_test]
    async fn cookie_from_previous_process_is_unauthorized() {
        let repo = Arc::new(InMemoryRepository::default());
        let (_old_client, cookie) = logged_in_client(repo.clone()).await;
        let (config, shared, sessions) = test_app(repo);
        let client = Client::untracked(build_rocket(config, shared, sessions)).await.expect("valid rocket instance");

        let response = client.get("/web/list/0/10").cookie(cookie).dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
    }
}
