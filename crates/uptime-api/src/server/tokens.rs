//! `api/tokens` handlers.
//!
//! Tokens are bearer credentials in their own right: reading, extending
//! and revoking one needs only its id.

use serde::Deserialize;

use super::request::{Request, Response};
use crate::error::{ApiError, Result};
use crate::integrity::IntegrityEngine;
use crate::integrity::fields::{Credentials, record_id};

#[derive(Debug, Default, Deserialize)]
struct TokenExtend {
    id: Option<String>,
    extend: Option<bool>,
}

pub async fn issue(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let (phone, password) = req.body_as::<Credentials>()?.validate()?;
    let token = engine.tokens().issue(&phone, &password).await?;
    Ok(Response::ok(&token))
}

pub async fn get(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let id = record_id("id", req.query("id"))?;
    let token = engine.tokens().lookup(&id).await?;
    Ok(Response::ok(&token))
}

pub async fn extend(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let body: TokenExtend = req.body_as()?;
    let id = record_id("id", body.id.as_deref())?;
    if body.extend != Some(true) {
        return Err(ApiError::Validation("extend must be true".into()));
    }
    let token = engine.tokens().extend(&id).await?;
    Ok(Response::ok(&token))
}

pub async fn revoke(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let id = record_id("id", req.query("id"))?;
    engine.tokens().revoke(&id).await?;
    Ok(Response::empty())
}
