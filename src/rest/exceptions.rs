//! /api/test/exception: endpoints for exercising the error path by hand
//!
//! POST /api/test/exception/illegal-argument?userId=123  -> 400
//! POST /api/test/exception/runtime                      -> 500
//! POST /api/test/exception/success?userId=999           -> 200

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::pipeline::Fault;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub status: &'static str,
    pub user_id: Option<String>,
    pub received_body: serde_json::Value,
    pub message: &'static str,
}

pub async fn caller_fault(
    query: Result<Query<UserQuery>, QueryRejection>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, Fault> {
    query?;
    payload?;
    Err(Fault::invalid_input("This is a test caller fault"))
}

pub async fn internal_fault(
    query: Result<Query<UserQuery>, QueryRejection>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, Fault> {
    query?;
    payload?;
    Err(Fault::internal("This is a test internal fault"))
}

pub async fn success(
    query: Result<Query<UserQuery>, QueryRejection>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<SuccessResponse>, Fault> {
    let Query(query) = query?;
    let Json(body) = payload?;
    Ok(Json(SuccessResponse {
        status: "success",
        user_id: query.user_id,
        received_body: body,
        message: "This is a successful response",
    }))
}
