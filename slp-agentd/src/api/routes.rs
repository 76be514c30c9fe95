use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use regex::Regex;
use serde::Deserialize;
use shared::path::ScrPath;
use shared::types::{ServiceEntry, ServiceType};
use shared::value::{Term, Value};
use crate::catalog;
use crate::services::Criteria;
use crate::worker::AgentHandle;

#[derive(Clone)]
pub struct AppState {
    pub agent: AgentHandle,
    /// Directory of static registration files
    pub regd_dir: Arc<PathBuf>,
}

/// Body of Read, Write and Execute requests
#[derive(Deserialize)]
pub struct Request {
    pub path: ScrPath,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub arg: Value,
}

#[derive(Deserialize)]
pub struct DirQuery {
    pub path: ScrPath,
}

#[derive(Deserialize)]
pub struct MatchQuery {
    pub pattern: String,
}

#[derive(Deserialize)]
pub struct AttributesQuery {
    pub url: String,
    #[serde(default)]
    pub ip: String,
}

#[derive(Deserialize)]
pub struct RegistrationRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct RegFileRequest {
    pub service: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/read", post(read))
        .route("/v1/write", post(write))
        .route("/v1/execute", post(execute))
        .route("/v1/dir", get(dir))
        .route("/v1/command", post(other_command))
        .route("/v1/services/:name", get(get_services))
        .route("/v1/services/:name/first", get(get_first_service))
        .route("/v1/types", get(get_types))
        .route("/v1/match", get(get_match))
        .route("/v1/attributes", get(get_attributes))
        .route("/v1/register", post(register))
        .route("/v1/deregister", post(deregister))
        .route("/v1/regfiles/:file", put(put_regfile).delete(delete_regfile))
        .with_state(state)
}

fn internal_error(e: anyhow::Error) -> StatusCode {
    tracing::error!("Agent request failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

// Read takes its options map as `value`, like the host's Read(path, options)
async fn read(
    State(state): State<AppState>,
    Json(req): Json<Request>,
) -> Result<Json<Value>, StatusCode> {
    state.agent.read(req.path, req.value).await.map(Json).map_err(internal_error)
}

async fn write(
    State(state): State<AppState>,
    Json(req): Json<Request>,
) -> Result<Json<Value>, StatusCode> {
    state
        .agent
        .write(req.path, req.value, req.arg)
        .await
        .map(Json)
        .map_err(internal_error)
}

async fn execute(
    State(state): State<AppState>,
    Json(req): Json<Request>,
) -> Result<Json<Value>, StatusCode> {
    state
        .agent
        .execute(req.path, req.value, req.arg)
        .await
        .map(Json)
        .map_err(internal_error)
}

async fn dir(
    State(state): State<AppState>,
    Query(query): Query<DirQuery>,
) -> Result<Json<Value>, StatusCode> {
    state.agent.dir(query.path).await.map(Json).map_err(internal_error)
}

async fn other_command(
    State(state): State<AppState>,
    Json(term): Json<Term>,
) -> Result<Json<Value>, StatusCode> {
    state.agent.other_command(term).await.map(Json).map_err(internal_error)
}

async fn get_services(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(criteria): Query<Criteria>,
) -> Result<Json<Vec<ServiceEntry>>, StatusCode> {
    state
        .agent
        .services(name, criteria)
        .await
        .map(Json)
        .map_err(internal_error)
}

async fn get_first_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(criteria): Query<Criteria>,
) -> Result<Json<ServiceEntry>, StatusCode> {
    state
        .agent
        .find_service(name, criteria)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn get_types(State(state): State<AppState>) -> Result<Json<Vec<ServiceType>>, StatusCode> {
    state.agent.types().await.map(Json).map_err(internal_error)
}

async fn get_match(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    let pattern = Regex::new(&query.pattern).map_err(|e| {
        tracing::warn!("Invalid match pattern {:?}: {}", query.pattern, e);
        StatusCode::BAD_REQUEST
    })?;
    state.agent.match_type(pattern).await.map(Json).map_err(internal_error)
}

async fn get_attributes(
    State(state): State<AppState>,
    Query(query): Query<AttributesQuery>,
) -> Result<Json<BTreeMap<String, String>>, StatusCode> {
    state
        .agent
        .attributes(query.url, query.ip)
        .await
        .map(Json)
        .map_err(internal_error)
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<Json<bool>, StatusCode> {
    state.agent.register(req.url).await.map(Json).map_err(internal_error)
}

async fn deregister(
    State(state): State<AppState>,
    Json(req): Json<RegistrationRequest>,
) -> Result<Json<bool>, StatusCode> {
    state.agent.deregister(req.url).await.map(Json).map_err(internal_error)
}

/// Registration file names must stay inside the regd directory
fn check_regfile_name(file: &str) -> Result<(), StatusCode> {
    if file.is_empty() || file.contains('/') || file.starts_with('.') {
        tracing::warn!("Rejected registration file name {:?}", file);
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(())
}

async fn put_regfile(
    State(state): State<AppState>,
    Path(file): Path<String>,
    Json(req): Json<RegFileRequest>,
) -> Result<StatusCode, StatusCode> {
    check_regfile_name(&file)?;
    let dir = state.regd_dir.clone();
    tokio::task::spawn_blocking(move || catalog::reg_file(&dir, &req.service, &req.attributes, &file))
        .await
        .map_err(|e| internal_error(e.into()))?
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_regfile(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<StatusCode, StatusCode> {
    check_regfile_name(&file)?;
    let path = state.regd_dir.join(&file);
    if !path.exists() {
        return Err(StatusCode::NOT_FOUND);
    }
    tokio::task::spawn_blocking(move || catalog::dereg_file(&path))
        .await
        .map_err(|e| internal_error(e.into()))?
        .map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}
