use axum::extract::State;

use crate::handler::AppState;
use crate::helpers::auth::AuthUser;
use crate::helpers::error::ApiError;
use crate::helpers::extract::Json;
use crate::helpers::response::{Message, Success};
use crate::service::accounts::{
    EmailRequest, FcmTokenRequest, LoginRequest, LoginResponse, ResetPasswordRequest, SignupRequest, SignupResponse,
    VerifyCodeRequest, VerifyEmailRequest,
};

pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Success<SignupResponse>, ApiError> {
    Ok(Success::created(state.accounts.signup(body).await?))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.accounts.verify_email(body).await?))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Success<LoginResponse>, ApiError> {
    Ok(Success::ok(state.accounts.login(body).await?))
}

pub async fn fcm_token(
    State(state): State<AppState>,
    AuthUser(id_user): AuthUser,
    Json(body): Json<FcmTokenRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.accounts.register_fcm_token(id_user, body).await?))
}

pub async fn send_reset_code(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.accounts.send_reset_code(body).await?))
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.accounts.verify_reset_code(body).await?))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.accounts.reset_password(body).await?))
}

pub async fn resend_code(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> Result<Success<Message>, ApiError> {
    Ok(Success::ok(state.accounts.resend_verification_code(body).await?))
}
