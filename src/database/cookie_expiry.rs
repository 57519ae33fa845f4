use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait CookieExpiryRepository {
    async fn get_cookie_expiry(&self, login: &str) -> Result<DateTime<Utc>, AppError>;
    async fn set_cookie_expiry(&self, login: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>;
}

#[async_trait::async_trait]
impl CookieExpiryRepository for PostgresRepository {
    async fn get_cookie_expiry(&self, login: &str) -> Result<DateTime<Utc>, AppError> {
        sqlx::query_scalar::<_, DateTime<Utc>>("SELECT expires_at FROM cookie_expiry WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Cookie expiry for {} not found", login)))
    }

    async fn set_cookie_expiry(&self, login: &str, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO cookie_expiry (login, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (login) DO UPDATE SET expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(login)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
