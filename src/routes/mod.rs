mod auth;
mod votes;

use axum::routing::{get, post};
use axum::Router;

use crate::handler::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/votes", get(votes::list_votes))
        .route("/votes/:id", get(votes::get_vote).post(votes::submit_vote))
        .route("/votes/:id/result", get(votes::vote_result))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/verify-email", post(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/fcm-token", post(auth::fcm_token))
        .route("/auth/forgot-password", post(auth::send_reset_code))
        .route("/auth/verify-code", post(auth::verify_code))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/resend-code", post(auth::resend_code))
        .with_state(state)
}
