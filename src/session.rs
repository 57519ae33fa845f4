use crate::config::SessionConfig;
use crate::database::SharedRepository;
use crate::database::cookie_expiry::CookieExpiryRepository;
use crate::error::app_error::AppError;
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::RngCore;
use rocket::http::{Cookie, SameSite};
use rocket::serde::json::serde_json;
use rocket::time::OffsetDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SESSION_COOKIE: &str = "session";

/// Longest accepted session lifetime, about a century.
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 366 * 100;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session token")]
    InvalidToken,
    #[error("session expired")]
    Expired,
    #[error("failed to seal session token")]
    Seal,
}

/// What a session token proves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub login: String,
    pub issued_at: i64,
}

/// Encryption key for session tokens. Generated once per process, so a
/// restart invalidates every outstanding cookie.
pub struct SessionKeys {
    encryption: [u8; KEY_LEN],
}

impl SessionKeys {
    pub fn generate() -> Self {
        let mut encryption = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut encryption);
        Self { encryption }
    }
}

/// Seals claims into `<issued_at>.<b64(nonce || ciphertext)>`.
///
/// The claims are encrypted with AES-256-GCM. The cookie name and the issue
/// time are bound as associated data, so a token cannot be replayed under
/// another cookie name or with a forged issue time.
pub struct SessionCodec {
    cipher: Aes256Gcm,
    max_age: Duration,
}

impl SessionCodec {
    pub fn new(keys: &SessionKeys, max_age: Duration) -> Self {
        Self {
            cipher: Aes256Gcm::new((&keys.encryption).into()),
            max_age,
        }
    }

    pub fn seal(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let plaintext = serde_json::to_vec(claims).map_err(|_| SessionError::Seal)?;
        let aad = associated_data(claims.issued_at);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|_| SessionError::Seal)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        Ok(format!("{}.{}", claims.issued_at, URL_SAFE_NO_PAD.encode(blob)))
    }

    pub fn open(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let (issued_at, payload) = token.split_once('.').ok_or(SessionError::InvalidToken)?;
        let issued_at: i64 = issued_at.parse().map_err(|_| SessionError::InvalidToken)?;

        let blob = URL_SAFE_NO_PAD.decode(payload).map_err(|_| SessionError::InvalidToken)?;
        if blob.len() <= NONCE_LEN {
            return Err(SessionError::InvalidToken);
        }
        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let aad = associated_data(issued_at);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: aad.as_bytes(),
                },
            )
            .map_err(|_| SessionError::InvalidToken)?;

        let claims: SessionClaims = serde_json::from_slice(&plaintext).map_err(|_| SessionError::InvalidToken)?;
        if claims.issued_at != issued_at {
            return Err(SessionError::InvalidToken);
        }

        if now.timestamp().saturating_sub(issued_at) > self.max_age.num_seconds() {
            return Err(SessionError::Expired);
        }

        Ok(claims)
    }
}

fn associated_data(issued_at: i64) -> String {
    format!("{}|{}", SESSION_COOKIE, issued_at)
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub login: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates session cookies and keeps the server-side expiry
/// record of each login in step with them.
pub struct SessionManager {
    codec: SessionCodec,
    repo: SharedRepository,
    expiration: Duration,
    cookie_secure: bool,
}

impl SessionManager {
    /// Lifetimes outside `0..=MAX_EXPIRATION_HOURS` are clamped into it.
    pub fn new(keys: SessionKeys, repo: SharedRepository, config: &SessionConfig) -> Self {
        let expiration = Duration::hours(config.expiration_hours.clamp(0, MAX_EXPIRATION_HOURS));
        Self {
            codec: SessionCodec::new(&keys, expiration),
            repo,
            expiration,
            cookie_secure: config.cookie_secure,
        }
    }

    pub async fn issue(&self, login: &str) -> Result<IssuedSession, AppError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(self.expiration).ok_or(SessionError::Seal)?;
        let token = self.codec.seal(&SessionClaims {
            login: login.to_string(),
            issued_at: now.timestamp(),
        })?;

        self.repo.set_cookie_expiry(login, expires_at).await?;

        Ok(IssuedSession {
            login: login.to_string(),
            token,
            expires_at,
        })
    }

    /// Checks the token and the stored expiry of its login, then re-issues the
    /// session so the expiry window slides forward.
    pub async fn validate(&self, token: &str) -> Result<IssuedSession, AppError> {
        let claims = self.codec.open(token, Utc::now())?;

        let stored_expiry = match self.repo.get_cookie_expiry(&claims.login).await {
            Ok(expires_at) => expires_at,
            Err(AppError::NotFound(_)) => return Err(SessionError::InvalidToken.into()),
            Err(err) => return Err(err),
        };
        if stored_expiry < Utc::now() {
            return Err(SessionError::Expired.into());
        }

        self.issue(&claims.login).await
    }

    #[cfg(test)]
    pub fn decode(&self, token: &str) -> Result<SessionClaims, SessionError> {
        self.codec.open(token, Utc::now())
    }

    pub fn cookie(&self, session: &IssuedSession) -> Cookie<'static> {
        let mut cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(rocket::time::Duration::seconds(self.expiration.num_seconds()));
        if let Ok(expires) = OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp()) {
            cookie = cookie.expires(expires);
        }
        cookie.build()
    }
}
