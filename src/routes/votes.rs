use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::handler::AppState;
use crate::helpers::auth::AuthUser;
use crate::helpers::error::ApiError;
use crate::helpers::extract::{Json, Path};
use crate::helpers::response::{Message, Success};
use crate::service::voting::{VoteDetail, VoteList, VoteResults};

#[derive(Deserialize)]
pub struct SubmitVoteRequest {
    pub items: Vec<Uuid>,
}

pub async fn list_votes(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Success<VoteList>, ApiError> {
    Ok(Success::ok(state.votes.list_open_votes().await?))
}

pub async fn get_vote(
    State(state): State<AppState>,
    AuthUser(id_user): AuthUser,
    Path(id_vote): Path<Uuid>,
) -> Result<Success<VoteDetail>, ApiError> {
    Ok(Success::ok(state.votes.get_vote_detail(id_vote, id_user).await?))
}

pub async fn submit_vote(
    State(state): State<AppState>,
    AuthUser(id_user): AuthUser,
    Path(id_vote): Path<Uuid>,
    Json(body): Json<SubmitVoteRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.votes.submit_vote(id_vote, id_user, &body.items).await?))
}

pub async fn vote_result(
    State(state): State<AppState>,
    AuthUser(id_user): AuthUser,
    Path(id_vote): Path<Uuid>,
) -> Result<Success<VoteResults>, ApiError> {
    Ok(Success::ok(state.votes.compute_vote_result(id_vote, id_user).await?))
}
