//! Stateless bearer token issue and verification.
//!
//! Tokens are HS256 JWTs carrying the principal plus issuance time. There
//! is no server-side revocation list; validity is purely signature-based,
//! so a compromised token stays valid until the secret rotates.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use shopkart_core::{Role, UserId};

use super::error::AuthError;
use crate::models::Principal;

/// Signed token claims: the principal plus issuance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: UserId,
    pub role: Role,
    /// Issued-at, unix seconds.
    pub iat: i64,
}

/// Mints and verifies bearer tokens against a server-held secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens carry no exp claim; validity is signature-only.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Serialize and sign the principal into an opaque token string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenIssuance`] if signing fails.
    pub fn issue(&self, principal: Principal) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.id,
            role: principal.role,
            iat: Utc::now().timestamp(),
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenIssuance(e.to_string()))
    }

    /// Verify the signature and deserialize the claims.
    ///
    /// The caller is responsible for re-resolving the referenced user; the
    /// role in the claims is stale by definition.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] on a bad signature or malformed
    /// claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
