use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use llego_common::{AppConfig, LlegoError, Result};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

/// Computes a PHC-format argon2id hash
///
/// CPU-intensive; call through `hash_password_blocking` from async code.
pub fn hash_password(password: &Secret<String>) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| LlegoError::internal(format!("Invalid argon2 parameters: {}", e)))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| LlegoError::internal(format!("Failed to hash password: {}", e)))
}

/// Checks a candidate password against a PHC-format hash
///
/// The hash carries its own parameters, so hashes made with other argon2
/// settings still verify.
pub fn verify_password(password_hash: &str, candidate: &Secret<String>) -> Result<bool> {
    let expected = PasswordHash::new(password_hash)
        .map_err(|e| LlegoError::internal(format!("Stored password hash is malformed: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(candidate.expose_secret().as_bytes(), &expected)
        .is_ok())
}

pub async fn hash_password_blocking(password: Secret<String>) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| LlegoError::internal(format!("Password hashing task failed: {}", e)))?
}

pub async fn verify_password_blocking(password_hash: String, candidate: Secret<String>) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password_hash, &candidate))
        .await
        .map_err(|e| LlegoError::internal(format!("Password verification task failed: {}", e)))?
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user email)
    pub sub: String,

    pub user_id: String,

    /// Issued at
    pub iat: usize,

    /// Expires at
    pub exp: usize,
}

/// HS256 access token issuer
#[derive(Clone)]
pub struct JwtIssuer {
    secret: Secret<String>,
    expire_minutes: i64,
}

impl JwtIssuer {
    pub fn new(secret: Secret<String>, expire_minutes: i64) -> Self {
        Self {
            secret,
            expire_minutes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.jwt_secret.clone(), config.jwt_expire_minutes)
    }

    pub fn expires_in_seconds(&self) -> i64 {
        self.expire_minutes * 60
    }

    pub fn create_token(&self, user_id: &str, email: &str) -> Result<String> {
        if user_id.is_empty() {
            return Err(LlegoError::internal("Cannot issue a token without user id"));
        }

        let now = Utc::now();
        let claims = TokenClaims {
            sub: email.to_string(),
            user_id: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + Duration::minutes(self.expire_minutes)).timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| LlegoError::internal(format!("Failed to encode token: {}", e)))
    }

    /// Validates signature and expiry
    pub fn decode_token(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| LlegoError::unauthorized(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = Secret::new("cafecito-123".to_string());
        let hash = hash_password(&password).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, &password).unwrap());
        assert!(!verify_password(&hash, &Secret::new("otra".to_string())).unwrap());
        assert!(verify_password("not-a-hash", &password).is_err());
    }

    #[test]
    fn test_hash_with_default_params_verifies() {
        let password = Secret::new("cafecito-123".to_string());
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .unwrap()
            .to_string();
        assert!(verify_password(&hash, &password).unwrap());
    }

    #[test]
    fn test_token_round_trip() {
        let issuer = JwtIssuer::new(Secret::new("secret".to_string()), 60);
        let token = issuer.create_token("u1", "ana@example.com").unwrap();

        let claims = issuer.decode_token(&token).unwrap();
        assert_eq!(claims.sub, "ana@example.com");
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let issuer = JwtIssuer::new(Secret::new("secret".to_string()), 60);
        let other = JwtIssuer::new(Secret::new("other".to_string()), 60);
        let token = issuer.create_token("u1", "ana@example.com").unwrap();

        assert!(matches!(
            other.decode_token(&token),
            Err(LlegoError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        // Past the default 60s leeway
        let issuer = JwtIssuer::new(Secret::new("secret".to_string()), -5);
        let token = issuer.create_token("u1", "ana@example.com").unwrap();
        assert!(issuer.decode_token(&token).is_err());
    }
}
