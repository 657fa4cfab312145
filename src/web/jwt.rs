//! HS256 access tokens.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Role, User};

pub const ISSUER: &str = "ebook-store-api";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    /// Unique per issued token, so two logins in the same second differ.
    pub jti: String,
}

/// Signs and verifies tokens with one shared secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, jsonwebtoken::errors::Error> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            iat,
            exp: iat.saturating_add(i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX)),
            iss: ISSUER.to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Check signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }

    /// Time left until the token stops verifying, zero if already past.
    ///
    /// Expiry is checked in whole seconds and a token is still accepted
    /// during its `exp` second, so this runs to the start of `exp + 1`.
    pub fn remaining_lifetime(claims: &Claims) -> Duration {
        let Ok(exp) = u64::try_from(claims.exp) else {
            return Duration::ZERO;
        };
        match UNIX_EPOCH.checked_add(Duration::from_secs(exp.saturating_add(1))) {
            Some(rejected_from) => rejected_from
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
            None => Duration::MAX,
        }
    }
}
