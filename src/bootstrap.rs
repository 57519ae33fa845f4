use crate::config::AdminConfig;
use crate::crypto::password::hash_password;
use crate::database::Repository;
use crate::database::credentials::CredentialsRepository;
use crate::error::app_error::AppError;
use tracing::info;

/// Writes the configured admin credentials to the store, replacing whatever
/// hash was stored for that login before. Runs once at startup, before the
/// server accepts connections.
pub async fn bootstrap_admin(repo: &dyn Repository, admin: &AdminConfig) -> Result<(), AppError> {
    if admin.login.trim().is_empty() {
        return Err(AppError::BadRequest("admin login must not be empty".to_string()));
    }
    if admin.password.is_empty() {
        return Err(AppError::BadRequest("admin password must not be empty".to_string()));
    }

    let password_hash = hash_password(&admin.password, admin.password_scheme)?;
    repo.set_credentials(&admin.login, &password_hash).await?;

    info!(login = %admin.login, scheme = ?admin.password_scheme, "admin credentials stored");
    Ok(())
}
