use rocket::serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Credentials {
    pub login: String,
    pub password_hash: String,
}

#[derive(Deserialize, Debug, Validate)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}
