//! `api/checks` and `api/checks/link` handlers.

use serde::Deserialize;

use super::request::{Request, Response};
use crate::error::Result;
use crate::integrity::IntegrityEngine;
use crate::integrity::fields::CheckFields;

#[derive(Debug, Default, Deserialize)]
struct CheckUpdate {
    id: Option<String>,
    #[serde(flatten)]
    fields: CheckFields,
}

#[derive(Debug, Default, Deserialize)]
struct CheckRef {
    id: Option<String>,
}

pub async fn create(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let check = engine.create_check(req.token(), req.body_as()?).await?;
    Ok(Response::ok(&check))
}

pub async fn get(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let check = engine.get_check(req.token(), req.query("id")).await?;
    Ok(Response::ok(&check))
}

pub async fn update(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let CheckUpdate { id, fields } = req.body_as()?;
    let check = engine
        .update_check(req.token(), id.as_deref(), fields)
        .await?;
    Ok(Response::ok(&check))
}

pub async fn delete(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    engine.delete_check(req.token(), req.query("id")).await?;
    Ok(Response::empty())
}

pub async fn link(engine: &IntegrityEngine, req: &Request) -> Result<Response> {
    let CheckRef { id } = req.body_as()?;
    let profile = engine.link_check(req.token(), id.as_deref()).await?;
    Ok(Response::ok(&profile))
}
