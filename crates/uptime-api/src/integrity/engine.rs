//! Owner-checked user and check operations.

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::fields::{self, CheckFields, NewUser, UserChanges};
use super::two_phase::TwoPhase;
use crate::auth::TokenAuthority;
use crate::auth::ids::random_id;
use crate::error::{ApiError, Result};
use crate::storage::{Check, EntityStore, User, UserProfile};

/// Outcome of a fully successful user deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub phone: String,
    pub deleted: usize,
    pub total: usize,
}

/// Sequences multi-record writes over users and checks.
#[derive(Debug, Clone)]
pub struct IntegrityEngine {
    store: EntityStore,
    tokens: TokenAuthority,
    max_checks: usize,
}

impl IntegrityEngine {
    pub const fn new(store: EntityStore, tokens: TokenAuthority, max_checks: usize) -> Self {
        Self {
            store,
            tokens,
            max_checks,
        }
    }

    pub const fn tokens(&self) -> &TokenAuthority {
        &self.tokens
    }

    pub const fn max_checks(&self) -> usize {
        self.max_checks
    }

    /// Fail unless `token` is live and belongs to `phone`.
    async fn require_owner(&self, token: Option<&str>, phone: &str) -> Result<()> {
        let Some(token) = token else {
            return Err(ApiError::Unauthorized("missing token".into()));
        };
        if self.tokens.verify(token, phone).await? {
            Ok(())
        } else {
            Err(ApiError::Unauthorized(
                "token is invalid, expired, or not yours".into(),
            ))
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    #[instrument(skip(self, input))]
    pub async fn create_user(&self, input: NewUser) -> Result<UserProfile> {
        let valid = input.validate()?;
        let user = User {
            hashed_password: self.tokens.hasher().hash(&valid.password)?,
            phone: valid.phone,
            first_name: valid.first_name,
            last_name: valid.last_name,
            tos_agreement: true,
            checks: Vec::new(),
        };
        self.store.create_user(&user).await?;

        info!(phone = %user.phone, "User created");
        Ok(user.into())
    }

    pub async fn get_user(&self, token: Option<&str>, phone: Option<&str>) -> Result<UserProfile> {
        let phone = fields::phone(phone)?;
        self.require_owner(token, &phone).await?;
        Ok(self.store.get_user(&phone).await?.into())
    }

    #[instrument(skip(self, token, changes))]
    pub async fn update_user(
        &self,
        token: Option<&str>,
        phone: Option<&str>,
        changes: UserChanges,
    ) -> Result<UserProfile> {
        let phone = fields::phone(phone)?;
        let patch = changes.validate()?;
        self.require_owner(token, &phone).await?;

        let mut user = self.store.get_user(&phone).await?;
        if let Some(first_name) = patch.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = last_name;
        }
        if let Some(password) = patch.password {
            user.hashed_password = self.tokens.hasher().hash(&password)?;
        }
        self.store.update_user(&user).await?;

        info!(phone = %user.phone, "User updated");
        Ok(user.into())
    }

    /// Delete a user, then every check on its list.
    ///
    /// The user record goes first and is not restored if a check deletion
    /// fails. Every listed check is attempted; any failure turns the result
    /// into [`ApiError::PartialCascadeFailure`] with the ids left behind.
    #[instrument(skip(self, token))]
    pub async fn delete_user(
        &self,
        token: Option<&str>,
        phone: Option<&str>,
    ) -> Result<CascadeReport> {
        let phone = fields::phone(phone)?;
        self.require_owner(token, &phone).await?;

        let user = self.store.get_user(&phone).await?;
        self.store.delete_user(&phone).await?;

        let total = user.checks.len();
        let mut failed = Vec::new();
        for check_id in user.checks {
            if let Err(e) = self.store.delete_check(&check_id).await {
                warn!(error = %e, check_id = %check_id, "Cascade could not delete check");
                failed.push(check_id);
            }
        }
        let deleted = total - failed.len();

        if failed.is_empty() {
            info!(deleted, "User deleted");
            Ok(CascadeReport {
                phone,
                deleted,
                total,
            })
        } else {
            warn!(deleted, total, "User deleted with leftover checks");
            Err(ApiError::PartialCascadeFailure {
                deleted,
                total,
                failed,
            })
        }
    }

    // =========================================================================
    // Checks
    // =========================================================================

    /// Create a check for the token's owner and link it to their list.
    #[instrument(skip(self, token, input))]
    pub async fn create_check(&self, token: Option<&str>, input: CheckFields) -> Result<Check> {
        let spec = input.validate_new()?;

        let Some(token) = token else {
            return Err(ApiError::Unauthorized("missing token".into()));
        };
        let phone = self.tokens.resolve(token).await?;
        let owner = match self.store.get_user(&phone).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return Err(ApiError::Unauthorized("token owner no longer exists".into()));
            }
            Err(e) => return Err(e.into()),
        };
        if owner.checks.len() >= self.max_checks {
            return Err(ApiError::QuotaExceeded {
                max: self.max_checks,
            });
        }

        let check = spec.into_check(random_id(), phone);
        let check = self
            .create_and_link(check, owner)
            .await
            .into_result(|check, cause| {
                warn!(check_id = %check.id, error = %cause, "Check created but not linked");
                ApiError::PartialFailure {
                    check_id: check.id,
                    reason: cause.to_string(),
                }
            })?;

        info!(check_id = %check.id, "Check created");
        Ok(check)
    }

    pub(super) async fn create_and_link(&self, check: Check, mut owner: User) -> TwoPhase<Check> {
        if let Err(e) = self.store.create_check(&check).await {
            return TwoPhase::Failed(e.into());
        }
        owner.checks.push(check.id.clone());
        match self.store.update_user(&owner).await {
            Ok(()) => TwoPhase::Complete(check),
            Err(e) => TwoPhase::FirstOnly {
                value: check,
                cause: e.into(),
            },
        }
    }

    /// Read a check and confirm the caller owns it.
    async fn owned_check(&self, token: Option<&str>, id: &str) -> Result<Check> {
        let check = self.store.get_check(id).await?;
        self.require_owner(token, &check.user_phone).await?;
        Ok(check)
    }

    pub async fn get_check(&self, token: Option<&str>, id: Option<&str>) -> Result<Check> {
        let id = fields::record_id("id", id)?;
        self.owned_check(token, &id).await
    }

    #[instrument(skip(self, token, changes))]
    pub async fn update_check(
        &self,
        token: Option<&str>,
        id: Option<&str>,
        changes: CheckFields,
    ) -> Result<Check> {
        let id = fields::record_id("id", id)?;
        let patch = changes.validate_changes()?;

        let mut check = self.owned_check(token, &id).await?;
        patch.apply(&mut check);
        self.store.update_check(&check).await?;

        info!(check_id = %check.id, "Check updated");
        Ok(check)
    }

    /// Delete a check, then remove it from its owner's list.
    ///
    /// A check whose id is not on the owner's list, or whose owner is gone,
    /// is still deleted and then reported as an integrity violation.
    #[instrument(skip(self, token))]
    pub async fn delete_check(&self, token: Option<&str>, id: Option<&str>) -> Result<()> {
        let id = fields::record_id("id", id)?;
        let check = self.owned_check(token, &id).await?;

        let id = self
            .delete_and_unlink(check)
            .await
            .into_result(|id, cause| {
                warn!(check_id = %id, error = %cause, "Check deleted but not unlinked");
                match cause {
                    violation @ ApiError::IntegrityViolation(_) => violation,
                    other => ApiError::PartialFailure {
                        check_id: id,
                        reason: other.to_string(),
                    },
                }
            })?;

        info!(check_id = %id, "Check deleted");
        Ok(())
    }

    pub(super) async fn delete_and_unlink(&self, check: Check) -> TwoPhase<String> {
        if let Err(e) = self.store.delete_check(&check.id).await {
            return TwoPhase::Failed(e.into());
        }

        let mut owner = match self.store.get_user(&check.user_phone).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return TwoPhase::FirstOnly {
                    cause: ApiError::IntegrityViolation(format!(
                        "owner {} of check {} does not exist",
                        check.user_phone, check.id
                    )),
                    value: check.id,
                };
            }
            Err(e) => {
                return TwoPhase::FirstOnly {
                    value: check.id,
                    cause: e.into(),
                };
            }
        };

        let Some(pos) = owner.checks.iter().position(|c| *c == check.id) else {
            return TwoPhase::FirstOnly {
                cause: ApiError::IntegrityViolation(format!(
                    "check {} was not on the check list of {}",
                    check.id, check.user_phone
                )),
                value: check.id,
            };
        };
        owner.checks.remove(pos);

        match self.store.update_user(&owner).await {
            Ok(()) => TwoPhase::Complete(check.id),
            Err(e) => TwoPhase::FirstOnly {
                value: check.id,
                cause: e.into(),
            },
        }
    }

    /// Put an existing check on its owner's list.
    ///
    /// Repairs the state left by a create whose link step failed. Linking
    /// an already linked check changes nothing.
    #[instrument(skip(self, token))]
    pub async fn link_check(&self, token: Option<&str>, id: Option<&str>) -> Result<UserProfile> {
        let id = fields::record_id("id", id)?;
        let check = self.owned_check(token, &id).await?;

        let mut owner = match self.store.get_user(&check.user_phone).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return Err(ApiError::IntegrityViolation(format!(
                    "owner {} of check {} does not exist",
                    check.user_phone, check.id
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if owner.checks.contains(&check.id) {
            return Ok(owner.into());
        }
        if owner.checks.len() >= self.max_checks {
            return Err(ApiError::QuotaExceeded {
                max: self.max_checks,
            });
        }
        owner.checks.push(check.id);
        self.store.update_user(&owner).await?;

        info!(check_id = %id, "Check linked");
        Ok(owner.into())
    }
}
