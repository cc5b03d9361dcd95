//! Authentication service.
//!
//! Passwords are hashed with argon2 (PHC strings). Sessions are stateless
//! HS256 JWTs whose subject is the user id.

use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::db::{self, CreateUser, DbPool, UpdateUser, User};
use crate::models::new_id;
use crate::{Error, Result};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 30;

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    db: DbPool,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(db: DbPool, config: &AuthConfig) -> Self {
        Self {
            db,
            encoding_key: Arc::new(EncodingKey::from_secret(config.jwt_secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.jwt_secret.as_bytes())),
            token_ttl: config.jwt_expires_in,
        }
    }

    /// Hash a password on the blocking pool.
    pub async fn hash_password(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || argon2_hash(&password))
            .await
            .map_err(|e| Error::Internal(format!("Password hashing task failed: {e}")))?
    }

    /// Check a password against a stored hash on the blocking pool.
    /// Malformed hashes never match.
    pub async fn verify_password(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || argon2_verify(&password, &hash))
            .await
            .map_err(|e| Error::Internal(format!("Password check task failed: {e}")))
    }

    pub fn issue_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::Internal(format!("failed to sign token: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }

    /// Create an account and sign the new user in.
    pub async fn register(&self, input: Registration) -> Result<(String, User)> {
        let username = input.username.trim();
        let email = normalize_email(&input.email);

        if username.is_empty() || email.is_empty() || input.password.is_empty() {
            return Err(Error::Validation(
                "Please provide username, email and password".into(),
            ));
        }
        validate_username(username)?;
        validate_email(&email)?;
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if db::get_user_by_email_or_username(&self.db, &email, username)
            .await?
            .is_some()
        {
            return Err(Error::AlreadyExists(
                "A user with this email or username already exists".into(),
            ));
        }

        let password_hash = Self::hash_password(input.password).await?;
        let user = db::create_user(
            &self.db,
            CreateUser {
                id: new_id(),
                username: username.to_string(),
                email,
                password_hash,
            },
        )
        .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");

        let token = self.issue_token(&user.id)?;
        Ok((token, user))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User)> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(Error::MissingCredentials);
        }

        let user = match db::get_user_by_email(&self.db, &email).await? {
            Some(user)
                if Self::verify_password(password.to_string(), user.password_hash.clone())
                    .await? =>
            {
                user
            }
            _ => {
                warn!(email = %email, "Failed login attempt");
                return Err(Error::InvalidCredentials);
            }
        };

        info!(user_id = %user.id, "User logged in");

        let token = self.issue_token(&user.id)?;
        Ok((token, user))
    }

    /// Apply a partial profile update.
    pub async fn update_profile(&self, user_id: &str, mut input: UpdateUser) -> Result<User> {
        if let Some(username) = input.username.take() {
            let username = username.trim().to_string();
            validate_username(&username)?;
            input.username = Some(username);
        }
        if let Some(email) = input.email.take() {
            let email = normalize_email(&email);
            validate_email(&email)?;
            input.email = Some(email);
        }

        let user = db::update_user(&self.db, user_id, input).await?;
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}

fn argon2_hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("failed to hash password: {e}")))
}

fn argon2_verify(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_LEN {
        return Err(Error::Validation(format!(
            "Username must be between 1 and {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(Error::Validation("Please provide a valid email".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> AuthService {
        let pool = db::init_pool(":memory:").await.unwrap();
        db::initialize_schema(&pool).await.unwrap();
        AuthService::new(
            pool,
            &AuthConfig {
                jwt_secret: "test-secret".into(),
                jwt_expires_in: Duration::from_secs(3600),
            },
        )
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.into(),
            email: email.into(),
            password: "hunter22".into(),
        }
    }

    #[tokio::test]
    async fn test_password_hash_roundtrip() {
        let hash = AuthService::hash_password("correct horse".into())
            .await
            .unwrap();

        assert!(hash.starts_with("$argon2"));
        let check = |password: &str, hash: &str| {
            AuthService::verify_password(password.to_string(), hash.to_string())
        };
        assert!(check("correct horse", &hash).await.unwrap());
        assert!(!check("wrong horse", &hash).await.unwrap());
        assert!(!check("correct horse", "not-a-hash").await.unwrap());
    }

    #[tokio::test]
    async fn test_token_roundtrip() {
        let auth = service().await;
        let token = auth.issue_token("user-1").unwrap();

        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let auth = service().await;
        let other = AuthService::new(
            db::init_pool(":memory:").await.unwrap(),
            &AuthConfig {
                jwt_secret: "another-secret".into(),
                jwt_expires_in: Duration::from_secs(3600),
            },
        );
        let token = other.issue_token("user-1").unwrap();

        assert!(matches!(auth.verify_token(&token), Err(Error::InvalidToken)));
        assert!(matches!(auth.verify_token("garbage"), Err(Error::InvalidToken)));
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let auth = service().await;
        let (_, user) = auth
            .register(registration("ada", " Ada@Example.com "))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");

        let (token, logged_in) = auth.login("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(auth.verify_token(&token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let auth = service().await;
        auth.register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        let same_email = auth
            .register(registration("grace", "ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(same_email, Error::AlreadyExists(_)));

        let same_name = auth
            .register(registration("ada", "grace@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(same_name, Error::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let auth = service().await;

        let missing = auth.register(registration("", "a@b.co")).await.unwrap_err();
        assert!(matches!(missing, Error::Validation(_)));

        let bad_email = auth.register(registration("ada", "nope")).await.unwrap_err();
        assert!(matches!(bad_email, Error::Validation(_)));

        let mut short = registration("ada", "ada@example.com");
        short.password = "123".into();
        assert!(matches!(
            auth.register(short).await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_login_failures() {
        let auth = service().await;
        auth.register(registration("ada", "ada@example.com"))
            .await
            .unwrap();

        assert!(matches!(
            auth.login("", "hunter22").await.unwrap_err(),
            Error::MissingCredentials
        ));
        assert!(matches!(
            auth.login("ada@example.com", "wrong").await.unwrap_err(),
            Error::InvalidCredentials
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "hunter22").await.unwrap_err(),
            Error::InvalidCredentials
        ));
    }
}
