//! /api/employees

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::AppState;
use crate::directory::{EmployeeRequest, EmployeeResponse};
use crate::pipeline::Fault;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub company_id: Option<u64>,
}

pub async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<EmployeeResponse>), Fault> {
    let Json(request) = payload?;
    let response = state.directory.create_employee(request)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<EmployeeResponse>, Fault> {
    let Path(id) = id?;
    Ok(Json(state.directory.get_employee(id)?))
}

pub async fn list_employees(
    State(state): State<AppState>,
    filter: Result<Query<EmployeeFilter>, QueryRejection>,
) -> Result<Json<Vec<EmployeeResponse>>, Fault> {
    let Query(filter) = filter?;
    Ok(Json(state.directory.list_employees(filter.company_id)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<EmployeeRequest>, JsonRejection>,
) -> Result<Json<EmployeeResponse>, Fault> {
    let Path(id) = id?;
    let Json(request) = payload?;
    Ok(Json(state.directory.update_employee(id, request)?))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, Fault> {
    let Path(id) = id?;
    state.directory.delete_employee(id)?;
    Ok(StatusCode::NO_CONTENT)
}
