//! Route handlers
//!
//! Thin adapters: pull the credential and payload out of the request, call
//! the matching [`ChatService`](crate::service::ChatService) method, and
//! shape the response.

use super::auth::BearerToken;
use super::error::ApiError;
use super::extract::{JsonBody, QueryParams};
use super::AppState;
use crate::accounts::Registration;
use crate::chat::{ChatView, ExitOutcome, NewChat};
use crate::messages::Message;
use crate::storage::User;
use crate::summarizer::SummaryOutcome;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
}

pub async fn signup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupRequest>,
) -> ApiResult<(StatusCode, Json<Registration>)> {
    let registration = state.signup(&body.username, &body.email).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

pub async fn current_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<User>> {
    Ok(Json(state.current_user(&token).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

pub async fn search_users(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    QueryParams(params): QueryParams<SearchQuery>,
) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.search_users(&token, &params.query).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(user_id): Path<String>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.get_user(&token, &user_id).await?))
}

pub async fn create_chat(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    JsonBody(body): JsonBody<NewChat>,
) -> ApiResult<(StatusCode, Json<ChatView>)> {
    let view = state.create_chat(&token, body).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn my_chats(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<Vec<ChatView>>> {
    Ok(Json(state.list_my_chats(&token).await?))
}

pub async fn get_chat(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<ChatView>> {
    Ok(Json(state.get_chat(&token, &chat_id).await?))
}

pub async fn list_participants(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.participants(&token, &chat_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParticipantAdded {
    pub chat_id: String,
    pub user_id: String,
}

pub async fn add_participant(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
    JsonBody(body): JsonBody<AddParticipantRequest>,
) -> ApiResult<(StatusCode, Json<ParticipantAdded>)> {
    let user_id = state
        .add_participant(&token, &chat_id, &body.username)
        .await?;
    Ok((StatusCode::CREATED, Json(ParticipantAdded { chat_id, user_id })))
}

pub async fn remove_participant(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path((chat_id, user_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .remove_participant(&token, &chat_id, &user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExitResponse {
    pub outcome: ExitOutcome,
}

pub async fn exit_chat(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<ExitResponse>> {
    let outcome = state.exit_chat(&token, &chat_id).await?;
    Ok(Json(ExitResponse { outcome }))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.delete_chat(&token, &chat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
    JsonBody(body): JsonBody<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let message = state.send_message(&token, &chat_id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    /// Only messages with a greater sequence
    pub after: Option<u64>,
}

pub async fn list_messages(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
    QueryParams(params): QueryParams<MessagesQuery>,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(
        state
            .list_messages(&token, &chat_id, params.after)
            .await?,
    ))
}

pub async fn get_summary(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    Path(chat_id): Path<String>,
) -> ApiResult<Json<SummaryOutcome>> {
    Ok(Json(state.get_summary(&token, &chat_id).await?))
}
