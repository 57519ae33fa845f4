use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::credentials::Credentials;

#[async_trait::async_trait]
pub trait CredentialsRepository {
    async fn set_credentials(&self, login: &str, password_hash: &str) -> Result<(), AppError>;
    async fn get_credentials(&self, login: &str) -> Result<Credentials, AppError>;
}

#[async_trait::async_trait]
impl CredentialsRepository for PostgresRepository {
    async fn set_credentials(&self, login: &str, password_hash: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO credentials (login, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (login) DO UPDATE SET password_hash = EXCLUDED.password_hash
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_credentials(&self, login: &str) -> Result<Credentials, AppError> {
        sqlx::query_as::<_, Credentials>("SELECT login, password_hash FROM credentials WHERE login = $1")
            .bind(login)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Credentials for {} not found", login)))
    }
}
