pub mod cookie_expiry;
pub mod credentials;
pub mod device;
pub mod device_error;
pub mod postgres_repository;

use crate::database::cookie_expiry::CookieExpiryRepository;
use crate::database::credentials::CredentialsRepository;
use crate::database::device::DeviceRepository;
use crate::database::device_error::DeviceErrorRepository;
use std::sync::Arc;

/// Everything the handlers and the session manager need from the store.
pub trait Repository: DeviceRepository + DeviceErrorRepository + CredentialsRepository + CookieExpiryRepository + Send + Sync {}

impl<T> Repository for T where T: DeviceRepository + DeviceErrorRepository + CredentialsRepository + CookieExpiryRepository + Send + Sync {}

pub type SharedRepository = Arc<dyn Repository>;
