//! Bearer credentials.
//!
//! Callers prove who they are with a signed token obtained at login. The rest
//! of the system only sees the [`IdentityVerifier`] capability; how the token
//! is built is an implementation detail of [`JwtIdentity`].
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("token required")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to issue token: {0}")]
    Issue(String),
}

/// Turns a bearer credential into an [`Identity`].
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, IdentityError>;
}

/// Mints bearer credentials for a user at login.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: &str) -> Result<String, IdentityError>;
}

/// Token payload.
///
/// Tokens minted here carry `id`. `_id` and `userId` are still accepted
/// because older clients were issued tokens with those claim names.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    /// The user the token speaks for: the first non-empty claim among `id`,
    /// `_id` and `userId`, in that order.
    pub fn subject(&self) -> Option<&str> {
        [&self.id, &self.legacy_id, &self.user_id]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }
}

/// HS256 tokens signed with a shared secret.
pub struct JwtIdentity {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl JwtIdentity {
    pub fn new(secret: &[u8], ttl: TimeDelta) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Sign arbitrary claims with this identity's secret.
    pub fn sign(&self, claims: &Claims) -> Result<String, IdentityError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| IdentityError::Issue(err.to_string()))
    }
}

impl IdentityVerifier for JwtIdentity {
    fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            tracing::debug!("rejected bearer token: {err}");
            IdentityError::InvalidToken
        })?;
        let user_id = data.claims.subject().ok_or(IdentityError::InvalidToken)?;

        Ok(Identity {
            user_id: user_id.to_string(),
        })
    }
}

impl TokenIssuer for JwtIdentity {
    fn issue(&self, user_id: &str) -> Result<String, IdentityError> {
        let now = Utc::now();
        self.sign(&Claims {
            id: Some(user_id.to_string()),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
            ..Default::default()
        })
    }
}
