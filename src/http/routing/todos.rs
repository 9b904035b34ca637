use axum::body::Bytes;
use axum::extract::{rejection::JsonRejection, Path, State};
use axum::{routing::{patch, post}, Json, Router};
use axum::http::{header, HeaderMap, StatusCode};
use serde_json::{json, Value};

use crate::application::{error::TodoError, todo_service::TodoService};
use crate::domain::todo::{TodoId, UpdateTodo};
use crate::http::types::ApiError;

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", post(create_todo::<S>).get(list_todos::<S>))
        .route("/todos/:todo_id", patch(update_todo::<S>).delete(delete_todo::<S>))
        .with_state(state)
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(payload) = payload?;
    let todo = state.service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "todo": todo }))))
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError> {
    let todos = state.service.list().await?;
    Ok(Json(json!({ "todos": todos })))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(todo_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&todo_id)?;
    // An unknown todo is reported before anything is said about the body.
    state.service.get(id.clone()).await?;
    let input = update_payload(&headers, &body)?;
    state.service.update(id, input).await?;
    Ok(Json(json!({})))
}

async fn delete_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(todo_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&todo_id)?;
    state.service.delete(id).await?;
    Ok(Json(json!({})))
}

/// Every field of a patch is optional, so a missing body or a non-JSON one is an empty patch.
fn update_payload(headers: &HeaderMap, body: &Bytes) -> Result<UpdateTodo, ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json") || ct.contains("+json"));
    if !is_json || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateTodo::default());
    }
    let Json(input) = Json::<UpdateTodo>::from_bytes(body)?;
    Ok(input)
}

fn parse_id(s: &str) -> Result<TodoId, ApiError> { TodoId::parse(s).ok_or(ApiError(TodoError::NotFound)) }
