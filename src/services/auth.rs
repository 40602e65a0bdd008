//! Credential registry and token issuance
//!
//! Credentials live in memory behind their own lock, independent from the
//! catalog mirror.

use std::{collections::HashMap, sync::Arc};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::sync::RwLock;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::UserClaims,
};

#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    /// username -> PHC password hash
    credentials: Arc<RwLock<HashMap<String, String>>>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            credentials: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new account
    pub async fn register(&self, username: &str, password: &str) -> AppResult<()> {
        let hash = hash_password(password)?;

        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(username) {
            return Err(AppError::AlreadyExists(format!("User {} already exists", username)));
        }
        credentials.insert(username.to_string(), hash);
        Ok(())
    }

    /// Check the password and issue a JWT
    pub async fn login(&self, username: &str, password: &str) -> AppResult<String> {
        let stored = self
            .credentials
            .read()
            .await
            .get(username)
            .cloned()
            .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

        if !verify_password(&stored, password)? {
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        UserClaims::new(username, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Could not create token: {}", e)))
    }

    /// Validate a bearer token
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    pub async fn account_count(&self) -> usize {
        self.credentials.read().await.len()
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
