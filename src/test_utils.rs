use crate::config::Config;
use crate::database::SharedRepository;
use crate::database::cookie_expiry::CookieExpiryRepository;
use crate::database::credentials::CredentialsRepository;
use crate::database::device::{DeviceRepository, join_device_errors};
use crate::database::device_error::DeviceErrorRepository;
use crate::error::app_error::AppError;
use crate::models::credentials::Credentials;
use crate::models::device::{Device, DeviceError, DeviceWithErrors, ErrorReportRequest};
use crate::session::{SessionKeys, SessionManager};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const TEST_API_KEY: &str = "123456";
pub const TEST_LOGIN: &str = "test";
pub const TEST_PASSWORD: &str = "test";

#[derive(Default)]
struct State {
    devices: Vec<Device>,
    errors: Vec<DeviceError>,
    credentials: HashMap<String, String>,
    cookie_expiry: HashMap<String, DateTime<Utc>>,
}

/// Store double that keeps everything in memory. Devices are kept in
/// registration order, matching the ordering of the Postgres store.
#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
    failing: bool,
}

impl InMemoryRepository {
    /// A repository whose every operation fails like an unreachable database.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub async fn device_errors(&self) -> Vec<DeviceError> {
        self.state.lock().await.errors.clone()
    }

    pub async fn devices(&self) -> Vec<Device> {
        self.state.lock().await.devices.clone()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::db("Database error", sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DeviceRepository for InMemoryRepository {
    async fn list_devices(&self, skip: i64, limit: i64) -> Result<Vec<DeviceWithErrors>, AppError> {
        self.check()?;
        let state = self.state.lock().await;
        let page: Vec<Device> = state
            .devices
            .iter()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(join_device_errors(&page, &state.errors))
    }

    async fn count_devices(&self) -> Result<i64, AppError> {
        self.check()?;
        Ok(self.state.lock().await.devices.len() as i64)
    }

    async fn upsert_device(&self, device_number: &str, register_date: DateTime<Utc>) -> Result<(), AppError> {
        self.check()?;
        let mut state = self.state.lock().await;
        match state.devices.iter_mut().find(|d| d.device_number == device_number) {
            Some(device) => device.register_date = register_date,
            None => state.devices.push(Device {
                id: Uuid::new_v4(),
                device_number: device_number.to_string(),
                register_date,
                created_at: Utc::now(),
            }),
        }
        Ok(())
    }

    async fn find_device_by_number(&self, device_number: &str) -> Result<Device, AppError> {
        self.check()?;
        let state = self.state.lock().await;
        state
            .devices
            .iter()
            .find(|d| d.device_number == device_number)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", device_number)))
    }
}

#[async_trait::async_trait]
impl DeviceErrorRepository for InMemoryRepository {
    async fn insert_error(&self, report: &ErrorReportRequest, occurred_at: DateTime<Utc>) -> Result<DeviceError, AppError> {
        let device = self.find_device_by_number(&report.device_number).await?;
        let error = DeviceError {
            id: Uuid::new_v4(),
            error_name: report.error_name.clone(),
            device_number: report.device_number.clone(),
            occurred_at,
            device_id: device.id,
        };
        self.state.lock().await.errors.push(error.clone());
        Ok(error)
    }
}

#[async_trait::async_trait]
impl CredentialsRepository for InMemoryRepository {
    async fn set_credentials(&self, login: &str, password_hash: &str) -> Result<(), AppError> {
        self.check()?;
        self.state
            .lock()
            .await
            .credentials
            .insert(login.to_string(), password_hash.to_string());
        Ok(())
    }

    async fn get_credentials(&self, login: &str) -> Result<Credentials, AppError> {
        self.check()?;
        let state = self.state.lock().await;
        state
            .credentials
            .get(login)
            .map(|hash| Credentials {
                login: login.to_string(),
                password_hash: hash.clone(),
            })
            .ok_or_else(|| AppError::NotFound(format!("Credentials for {} not found", login)))
    }
}

#[async_trait::async_trait]
impl CookieExpiryRepository for InMemoryRepository {
    async fn get_cookie_expiry(&self, login: &str) -> Result<DateTime<Utc>, AppError> {
        self.check()?;
        let state = self.state.lock().await;
        state
            .cookie_expiry
            .get(login)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("Cookie expiry for {} not found", login)))
    }

    async fn set_cookie_expiry(&self, login: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        self.check()?;
        self.state.lock().await.cookie_expiry.insert(login.to_string(), expires_at);
        Ok(())
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.api.key = TEST_API_KEY.to_string();
    config.admin.login = TEST_LOGIN.to_string();
    config.admin.password = TEST_PASSWORD.to_string();
    config.session.cookie_secure = false;
    config
}

/// Config, repository and session manager wired the way `run` wires them,
/// with the in-memory store in place of Postgres.
pub fn test_app(repo: Arc<InMemoryRepository>) -> (Config, SharedRepository, SessionManager) {
    let config = test_config();
    let shared: SharedRepository = repo;
    let sessions = SessionManager::new(SessionKeys::generate(), shared.clone(), &config.session);
    (config, shared, sessions)
}
