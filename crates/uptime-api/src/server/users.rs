//! `api/users` handlers.

use serde::Deserialize;

use super::request::{Request, Response};
use crate::error::Result;
use crate::integrity::IntegrityEngine;
use crate::integrity::fields::{NewUser, UserChanges};

#[derive(Debug, Default, Deserialize)]
struct UserUpdate {
    phone: Option<String>,
    #[serde(flatten)]
    changes: UserChanges,
}

pub async fn create(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let profile = engine.create_user(req.body_as::<NewUser>()?).await?;
    Ok(Response::ok(&profile))
}

pub async fn get(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let profile = engine.get_user(req.token(), req.query("phone")).await?;
    Ok(Response::ok(&profile))
}

pub async fn update(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let UserUpdate { phone, changes } = req.body_as()?;
    let profile = engine
        .update_user(req.token(), phone.as_deref(), changes)
        .await?;
    Ok(Response::ok(&profile))
}

pub async fn delete(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let report = engine.delete_user(req.token(), req.query("phone")).await?;
    Ok(Response::ok(&report))
}
