use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Device {
    pub id: Uuid,
    pub device_number: String,
    pub register_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Immutable record of an error a device reported.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct DeviceError {
    pub id: Uuid,
    pub error_name: String,
    pub device_number: String,
    pub occurred_at: DateTime<Utc>,
    pub device_id: Uuid,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceErrorSummary {
    pub error_name: String,
    pub device_number: String,
}

impl From<&DeviceError> for DeviceErrorSummary {
    fn from(error: &DeviceError) -> Self {
        Self {
            error_name: error.error_name.clone(),
            device_number: error.device_number.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct DeviceWithErrors {
    pub device_number: String,
    pub register_date: DateTime<Utc>,
    pub errors: Vec<DeviceErrorSummary>,
}

impl DeviceWithErrors {
    pub fn new(device: &Device, errors: Vec<DeviceErrorSummary>) -> Self {
        Self {
            device_number: device.device_number.clone(),
            register_date: device.register_date,
            errors,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceList {
    pub devices: Vec<DeviceWithErrors>,
    pub total: i64,
}

#[derive(Deserialize, Debug, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct RegisterDeviceRequest {
    #[validate(length(min = 1, message = "device-number must not be empty"))]
    pub device_number: String,
}

#[derive(Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorReportRequest {
    #[validate(length(min = 1, message = "error-name must not be empty"))]
    pub error_name: String,
    #[validate(length(min = 1, message = "device-number must not be empty"))]
    pub device_number: String,
}
