//! Typed queries for Uptime storage.

use super::models::{CHECKS, Check, TOKENS, Token, USERS, User};
use super::store::{EntityStore, StoreError};

impl EntityStore {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user keyed by phone.
    pub async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.create(USERS, &user.phone, user).await
    }

    /// Get a user by phone.
    pub async fn get_user(&self, phone: &str) -> Result<User, StoreError> {
        self.read(USERS, phone).await
    }

    /// Replace a user record.
    pub async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        self.update(USERS, &user.phone, user).await
    }

    /// Remove a user record. Owned checks are left to the caller.
    pub async fn delete_user(&self, phone: &str) -> Result<(), StoreError> {
        self.delete(USERS, phone).await
    }

    // =========================================================================
    // Token queries
    // =========================================================================

    pub async fn create_token(&self, token: &Token) -> Result<(), StoreError> {
        self.create(TOKENS, &token.id, token).await
    }

    pub async fn get_token(&self, id: &str) -> Result<Token, StoreError> {
        self.read(TOKENS, id).await
    }

    pub async fn update_token(&self, token: &Token) -> Result<(), StoreError> {
        self.update(TOKENS, &token.id, token).await
    }

    pub async fn delete_token(&self, id: &str) -> Result<(), StoreError> {
        self.delete(TOKENS, id).await
    }

    // =========================================================================
    // Check queries
    // =========================================================================

    pub async fn create_check(&self, check: &Check) -> Result<(), StoreError> {
        self.create(CHECKS, &check.id, check).await
    }

    pub async fn get_check(&self, id: &str) -> Result<Check, StoreError> {
        self.read(CHECKS, id).await
    }

    pub async fn update_check(&self, check: &Check) -> Result<(), StoreError> {
        self.update(CHECKS, &check.id, check).await
    }

    pub async fn delete_check(&self, id: &str) -> Result<(), StoreError> {
        self.delete(CHECKS, id).await
    }

    /// Ids of every persisted check, across all owners.
    pub async fn list_check_ids(&self) -> Result<Vec<String>, StoreError> {
        self.list(CHECKS).await
    }
}
