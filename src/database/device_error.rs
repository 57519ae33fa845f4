use crate::database::device::DeviceRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::device::{DeviceError, ErrorReportRequest};
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait DeviceErrorRepository {
    /// Resolves the reporting device by number and appends the error. An
    /// unknown device number fails with `NotFound` and nothing is written.
    async fn insert_error(&self, report: &ErrorReportRequest, occurred_at: DateTime<Utc>) -> Result<DeviceError, AppError>;
}

#[async_trait::async_trait]
impl DeviceErrorRepository for PostgresRepository {
    async fn insert_error(&self, report: &ErrorReportRequest, occurred_at: DateTime<Utc>) -> Result<DeviceError, AppError> {
        let device = self.find_device_by_number(&report.device_number).await?;

        let error = sqlx::query_as::<_, DeviceError>(
            r#"
            INSERT INTO device_errors (error_name, device_number, occurred_at, device_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, error_name, device_number, occurred_at, device_id
            "#,
        )
        .bind(&report.error_name)
        .bind(&report.device_number)
        .bind(occurred_at)
        .bind(device.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(error)
    }
}
