//! Dispatch table from `(route, verb)` to handler.

use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use uptime_core::Config;

use super::request::{Request, Response};
use super::{checks, tokens, users};
use crate::auth::{PasswordHasher, TokenAuthority};
use crate::error::{ApiError, Result};
use crate::integrity::IntegrityEngine;
use crate::storage::EntityStore;

/// Every path the service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Ping,
    Users,
    Tokens,
    Checks,
    CheckLinks,
}

impl Route {
    /// Match a path, ignoring leading and trailing slashes.
    pub fn parse(path: &str) -> Option<Self> {
        match path.trim_matches('/') {
            "ping" => Some(Self::Ping),
            "api/users" => Some(Self::Users),
            "api/tokens" => Some(Self::Tokens),
            "api/checks" => Some(Self::Checks),
            "api/checks/link" => Some(Self::CheckLinks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Verb {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(ApiError::MethodNotAllowed(s.to_string())),
        }
    }
}

/// Routes requests onto the integrity engine.
#[derive(Debug, Clone)]
pub struct Router {
    engine: IntegrityEngine,
}

impl Router {
    pub const fn new(engine: IntegrityEngine) -> Self {
        Self { engine }
    }

    /// Wire store, hasher, token authority and engine from `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = EntityStore::open(config.storage.data_dir.clone()).await?;
        let hasher = PasswordHasher::new(config.auth.hashing_secret.as_bytes());
        let tokens = TokenAuthority::new(
            store.clone(),
            hasher,
            Duration::from_secs(config.auth.token_ttl_secs),
        );
        info!(
            data_dir = %config.storage.data_dir.display(),
            max_checks = config.checks.max_checks_per_user,
            "Router ready"
        );
        Ok(Self::new(IntegrityEngine::new(
            store,
            tokens,
            config.checks.max_checks_per_user,
        )))
    }

    /// Handle one request. Errors become error responses; this never fails.
    #[instrument(skip(self, req), fields(method = %req.method, path = %req.path))]
    pub async fn dispatch(&self, req: &Request) -> Response {
        match self.handle(req).await {
            Ok(resp) => {
                debug!(status = resp.status_code, "Request handled");
                resp
            }
            Err(e) => {
                let resp = Response::from_error(&e);
                if resp.status_code >= 500 {
                    warn!(status = resp.status_code, error = %e, "Request failed");
                } else {
                    debug!(status = resp.status_code, error = %e, "Request rejected");
                }
                resp
            }
        }
    }

    async fn handle(&self, req: &Request) -> Result<Response> {
        let route = Route::parse(&req.path)
            .ok_or_else(|| ApiError::NotFound(format!("no route for {}", req.path)))?;
        let verb: Verb = req.method.parse()?;
        let engine = &self.engine;

        match (route, verb) {
            (Route::Ping, _) => Ok(Response::empty()),

            (Route::Users, Verb::Post) => users::create(engine, req).await,
            (Route::Users, Verb::Get) => users::get(engine, req).await,
            (Route::Users, Verb::Put) => users::update(engine, req).await,
            (Route::Users, Verb::Delete) => users::delete(engine, req).await,

            (Route::Tokens, Verb::Post) => tokens::issue(engine, req).await,
            (Route::Tokens, Verb::Get) => tokens::get(engine, req).await,
            (Route::Tokens, Verb::Put) => tokens::extend(engine, req).await,
            (Route::Tokens, Verb::Delete) => tokens::revoke(engine, req).await,

            (Route::Checks, Verb::Post) => checks::create(engine, req).await,
            (Route::Checks, Verb::Get) => checks::get(engine, req).await,
            (Route::Checks, Verb::Put) => checks::update(engine, req).await,
            (Route::Checks, Verb::Delete) => checks::delete(engine, req).await,

            (Route::CheckLinks, Verb::Post) => checks::link(engine, req).await,
            (Route::CheckLinks, Verb::Get | Verb::Put | Verb::Delete) => {
                Err(ApiError::MethodNotAllowed(req.method.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_ignore_surrounding_slashes() {
        assert_eq!(Route::parse("/api/users/"), Some(Route::Users));
        assert_eq!(Route::parse("ping"), Some(Route::Ping));
        assert_eq!(Route::parse("api/checks/link"), Some(Route::CheckLinks));
        assert_eq!(Route::parse("api/things"), None);
        assert_eq!(Route::parse(""), None);
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!("GET".parse::<Verb>().ok(), Some(Verb::Get));
        assert_eq!("Delete".parse::<Verb>().ok(), Some(Verb::Delete));
        assert!(matches!(
            "patch".parse::<Verb>(),
            Err(ApiError::MethodNotAllowed(_))
        ));
    }
}
