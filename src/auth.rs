use std::convert::Infallible;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar};

use crate::{
    error::AppError,
    models::user::{UserAccount, UserRole},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "travelviz_session";

/// Fresh salt per call, so hashing the same password twice yields
/// different strings; only `verify_password` equality matters.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))?;
    Ok(hash.to_string())
}

/// False on mismatch and on a malformed stored hash (e.g. a legacy
/// plain-text value); never an error.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plain.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
    pub role: UserRole,
}

pub async fn register_user(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::BadRequest(
            "Please enter both username and password.".into(),
        ));
    }
    // The username names the profile-picture file, so keep it path-safe.
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::BadRequest(
            "Usernames may only contain letters, digits, '_' and '-'.".into(),
        ));
    }

    let mut users = state.store.load_users().await?;
    if users.contains_key(username) {
        return Err(AppError::BadRequest("Username already exists.".into()));
    }

    let account = UserAccount::new(hash_password(password)?);
    let role = account.role;
    users.insert(username.to_string(), account);
    state.store.save_users(&users).await?;

    Ok(AuthenticatedUser {
        username: username.to_string(),
        role,
    })
}

/// Uniform failure whether the username or the password was wrong.
pub async fn authenticate_user(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<AuthenticatedUser, AppError> {
    let users = state.store.load_users().await?;
    let username = username.trim();
    let account = users.get(username).ok_or(AppError::Unauthorized)?;
    if verify_password(password, &account.password_hash) {
        Ok(AuthenticatedUser {
            username: username.to_string(),
            role: account.role,
        })
    } else {
        Err(AppError::Unauthorized)
    }
}

pub fn apply_session_cookie(jar: PrivateCookieJar, username: &str) -> PrivateCookieJar {
    let mut cookie = Cookie::new(SESSION_COOKIE, username.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    jar.remove(cookie)
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|err: Infallible| -> AppError { match err {} })?;

        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Ok(Self(None));
        };
        let username = cookie.value().to_string();

        let users = state.store.load_users().await?;
        Ok(Self(users.get(&username).map(|account| AuthenticatedUser {
            username: username.clone(),
            role: account.role,
        })))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn require_admin(&self) -> Result<&AuthenticatedUser, AppError> {
        let user = self.require_user()?;
        if user.role == UserRole::Admin {
            Ok(user)
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifies() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("s3cret", &first));
        assert!(verify_password("s3cret", &second));
        assert!(!verify_password("wrong", &first));
    }

    #[test]
    fn malformed_hash_verifies_false_not_panic() {
        assert!(!verify_password("anything", "hunter2"));
        assert!(!verify_password("anything", ""));
    }
}
