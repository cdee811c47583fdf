use std::collections::HashSet;

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider, Role, SessionUser};

const AUDIENCE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub app_role: Option<String>,
    pub aud: String,
    pub exp: i64,
}

/// Verifies HS256 tokens minted by the external auth provider.
///
/// Sign-out is local: revoked tokens are remembered until the process exits,
/// and expire on their own at the provider.
pub struct JwtAuthProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    revoked: RwLock<HashSet<String>>,
}

impl JwtAuthProvider {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        validation.leeway = 30;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            revoked: RwLock::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl AuthProvider for JwtAuthProvider {
    async fn current_user(&self, token: &str) -> Result<SessionUser, AuthError> {
        if self.revoked.read().await.contains(token) {
            return Err(AuthError::SignedOut);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::InvalidToken("token expired".into()),
                ErrorKind::InvalidSignature => {
                    tracing::warn!("Token with invalid signature rejected");
                    AuthError::InvalidToken("bad signature".into())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })?
            .claims;

        Ok(SessionUser {
            id: claims.sub,
            email: claims.email,
            role: Role::from_claim(claims.app_role.as_deref()),
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.current_user(token).await?;
        self.revoked.write().await.insert(token.to_string());
        Ok(())
    }
}
