//! Bearer token issuance, verification, extension and revocation.
//!
//! Tokens are plain records in the `tokens` collection. Expiry is checked
//! lazily whenever a token is used; nothing sweeps expired tokens, so they
//! persist on disk until revoked.

use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use uptime_core::key::is_valid_key;
use uptime_core::time::unix_millis;

use super::AuthError;
use super::ids::random_id;
use super::password::PasswordHasher;
use crate::storage::{EntityStore, Token};

/// Issues and validates tokens against the entity store.
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    store: EntityStore,
    hasher: PasswordHasher,
    ttl_millis: i64,
}

impl TokenAuthority {
    pub fn new(store: EntityStore, hasher: PasswordHasher, ttl: Duration) -> Self {
        Self {
            store,
            hasher,
            ttl_millis: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub const fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    fn expiry_from_now(&self) -> i64 {
        unix_millis().saturating_add(self.ttl_millis)
    }

    /// Mint a token for `phone` if `password` matches the stored hash.
    ///
    /// An unknown phone and a wrong password are indistinguishable to the
    /// caller.
    #[instrument(skip(self, password))]
    pub async fn issue(&self, phone: &str, password: &str) -> Result<Token, AuthError> {
        let user = match self.store.get_user(phone).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                warn!("Token requested for unknown user");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !self.hasher.verify(password, &user.hashed_password)? {
            warn!("Failed token issue attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let token = Token {
            id: random_id(),
            phone: user.phone,
            expires: self.expiry_from_now(),
        };
        self.store.create_token(&token).await?;

        info!(token = %short(&token.id), expires = token.expires, "Token issued");
        Ok(token)
    }

    /// Fetch a stored token regardless of expiry.
    pub async fn lookup(&self, token_id: &str) -> Result<Token, AuthError> {
        if !is_valid_key(token_id) {
            return Err(AuthError::TokenNotFound);
        }
        self.store.get_token(token_id).await.map_err(|e| {
            if e.is_not_found() {
                AuthError::TokenNotFound
            } else {
                e.into()
            }
        })
    }

    /// `true` iff the token exists, belongs to `phone`, and has not expired.
    ///
    /// Re-evaluated from storage on every call. Storage failures other than
    /// absence are surfaced rather than read as `false`.
    pub async fn verify(&self, token_id: &str, phone: &str) -> Result<bool, AuthError> {
        match self.lookup(token_id).await {
            Ok(token) => {
                let valid = token.phone == phone && token.is_live_at(unix_millis());
                debug!(token = %short(token_id), valid, "Token verified");
                Ok(valid)
            }
            Err(AuthError::TokenNotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Resolve a live token to the phone that owns it.
    pub async fn resolve(&self, token_id: &str) -> Result<String, AuthError> {
        match self.lookup(token_id).await {
            Ok(token) if token.is_live_at(unix_millis()) => Ok(token.phone),
            Ok(_) => Err(AuthError::Unauthorized("token has expired".into())),
            Err(AuthError::TokenNotFound) => {
                Err(AuthError::Unauthorized("token is not recognised".into()))
            }
            Err(e) => Err(e),
        }
    }

    /// Push the expiry of a live token to a full TTL from now.
    #[instrument(skip(self, token_id), fields(token = %short(token_id)))]
    pub async fn extend(&self, token_id: &str) -> Result<Token, AuthError> {
        let mut token = self.lookup(token_id).await?;
        if !token.is_live_at(unix_millis()) {
            return Err(AuthError::AlreadyExpired);
        }

        token.expires = self.expiry_from_now();
        self.store.update_token(&token).await?;

        info!(expires = token.expires, "Token extended");
        Ok(token)
    }

    /// Delete a token.
    #[instrument(skip(self, token_id), fields(token = %short(token_id)))]
    pub async fn revoke(&self, token_id: &str) -> Result<(), AuthError> {
        if !is_valid_key(token_id) {
            return Err(AuthError::TokenNotFound);
        }
        self.store.delete_token(token_id).await.map_err(|e| {
            if e.is_not_found() {
                AuthError::TokenNotFound
            } else {
                e.into()
            }
        })?;
        info!("Token revoked");
        Ok(())
    }
}

/// Log-safe prefix of a token id.
fn short(token_id: &str) -> &str {
    token_id.get(..4).unwrap_or(token_id)
}
