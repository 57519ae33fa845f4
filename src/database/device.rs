use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::device::{Device, DeviceError, DeviceErrorSummary, DeviceWithErrors};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait::async_trait]
pub trait DeviceRepository {
    /// Devices ordered by first registration (ties broken by id), each joined
    /// with its errors in the order they were reported.
    async fn list_devices(&self, skip: i64, limit: i64) -> Result<Vec<DeviceWithErrors>, AppError>;
    async fn count_devices(&self) -> Result<i64, AppError>;
    async fn upsert_device(&self, device_number: &str, register_date: DateTime<Utc>) -> Result<(), AppError>;
    async fn find_device_by_number(&self, device_number: &str) -> Result<Device, AppError>;
}

/// Attaches each error to the device whose identity it references. Devices
/// keep their order; errors keep the order they were given in.
pub(crate) fn join_device_errors(devices: &[Device], errors: &[DeviceError]) -> Vec<DeviceWithErrors> {
    let mut by_device: HashMap<Uuid, Vec<DeviceErrorSummary>> = HashMap::new();
    for error in errors {
        by_device.entry(error.device_id).or_default().push(error.into());
    }

    devices
        .iter()
        .map(|device| DeviceWithErrors::new(device, by_device.remove(&device.id).unwrap_or_default()))
        .collect()
}

#[async_trait::async_trait]
impl DeviceRepository for PostgresRepository {
    async fn list_devices(&self, skip: i64, limit: i64) -> Result<Vec<DeviceWithErrors>, AppError> {
        let devices = sqlx::query_as::<_, Device>(
            r#"
            SELECT id, device_number, register_date, created_at
            FROM devices
            ORDER BY created_at ASC, id ASC
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        if devices.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = devices.iter().map(|d| d.id).collect();
        let errors = sqlx::query_as::<_, DeviceError>(
            r#"
            SELECT id, error_name, device_number, occurred_at, device_id
            FROM device_errors
            WHERE device_id = ANY($1)
            ORDER BY occurred_at ASC, id ASC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        Ok(join_device_errors(&devices, &errors))
    }

    async fn count_devices(&self) -> Result<i64, AppError> {
        #[derive(sqlx::FromRow)]
        struct CountRow {
            total: i64,
        }

        let row = sqlx::query_as::<_, CountRow>("SELECT COUNT(*) AS total FROM devices")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.total)
    }

    async fn upsert_device(&self, device_number: &str, register_date: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO devices (device_number, register_date)
            VALUES ($1, $2)
            ON CONFLICT (device_number) DO UPDATE SET register_date = EXCLUDED.register_date
            "#,
        )
        .bind(device_number)
        .bind(register_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_device_by_number(&self, device_number: &str) -> Result<Device, AppError> {
        sqlx::query_as::<_, Device>(
            r#"
            SELECT id, device_number, register_date, created_at
            FROM devices
            WHERE device_number = $1
            "#,
        )
        .bind(device_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Device {} not found", device_number)))
    }
}
