//! /api/companies

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::AppState;
use crate::directory::{CompanyRequest, CompanyResponse};
use crate::pipeline::Fault;

pub async fn create_company(
    State(state): State<AppState>,
    payload: Result<Json<CompanyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CompanyResponse>), Fault> {
    let Json(request) = payload?;
    let response = state.directory.create_company(request)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_company(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<CompanyResponse>, Fault> {
    let Path(id) = id?;
    Ok(Json(state.directory.get_company(id)?))
}

pub async fn list_companies(State(state): State<AppState>) -> Json<Vec<CompanyResponse>> {
    Json(state.directory.list_companies())
}

pub async fn update_company(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<CompanyRequest>, JsonRejection>,
) -> Result<Json<CompanyResponse>, Fault> {
    let Path(id) = id?;
    let Json(request) = payload?;
    Ok(Json(state.directory.update_company(id, request)?))
}

pub async fn delete_company(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, Fault> {
    let Path(id) = id?;
    state.directory.delete_company(id)?;
    Ok(StatusCode::NO_CONTENT)
}
