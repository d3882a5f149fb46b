use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::dbclient::DBClient;
use crate::db::model;
use crate::db::schema::{EmailVerification, Tally, User, UserVote, Vote, VoteItem};

/// Queries the voting workflow needs, one method per query shape.
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn list_open_votes(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Vote>>;

    async fn get_vote(&self, id_vote: Uuid) -> anyhow::Result<Option<Vote>>;

    async fn get_vote_items(&self, id_vote: Uuid) -> anyhow::Result<Vec<VoteItem>>;

    async fn get_user_vote(&self, id_vote: Uuid, id_user: Uuid) -> anyhow::Result<Option<UserVote>>;

    async fn get_user_vote_choices(&self, id_user_vote: Uuid) -> anyhow::Result<Vec<Uuid>>;

    /// All-or-nothing. `Ok(false)` means a ballot for (vote, user) already exists.
    async fn add_ballot(&self, id_vote: Uuid, id_user: Uuid, choices: &[VoteItem], now: DateTime<Utc>) -> anyhow::Result<bool>;

    /// One row per item of the vote, including items with no votes.
    async fn tally_vote(&self, id_vote: Uuid) -> anyhow::Result<Vec<Tally>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_user(&self, id_user: Uuid) -> anyhow::Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    async fn get_user_by_login(&self, email_or_card_id: &str) -> anyhow::Result<Option<User>>;

    async fn find_conflicting_user(&self, email: &str, phone_number: Option<&str>) -> anyhow::Result<Option<User>>;

    /// `Ok(false)` when a unique column is already taken.
    async fn add_user(&self, user: &User, code: &str) -> anyhow::Result<bool>;

    async fn get_verification(&self, id_user: Uuid) -> anyhow::Result<Option<EmailVerification>>;

    async fn replace_verification(&self, id_user: Uuid, code: &str, now: DateTime<Utc>) -> anyhow::Result<()>;

    async fn mark_verified(&self, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()>;

    async fn update_password(&self, id_user: Uuid, hashed_password: &str, now: DateTime<Utc>) -> anyhow::Result<()>;

    async fn set_fcm_token(&self, id_user: Uuid, token: &str, now: DateTime<Utc>) -> anyhow::Result<bool>;

    async fn add_session(&self, token: &str, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()>;

    async fn get_session_user(&self, token: &str) -> anyhow::Result<Option<Uuid>>;
}

#[async_trait]
impl VoteStore for DBClient {
    async fn list_open_votes(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Vote>> {
        model::list_open_votes(self.conn(), now).await
    }

    async fn get_vote(&self, id_vote: Uuid) -> anyhow::Result<Option<Vote>> {
        model::get_vote(self.conn(), id_vote).await
    }

    async fn get_vote_items(&self, id_vote: Uuid) -> anyhow::Result<Vec<VoteItem>> {
        model::get_vote_items(self.conn(), id_vote).await
    }

    async fn get_user_vote(&self, id_vote: Uuid, id_user: Uuid) -> anyhow::Result<Option<UserVote>> {
        model::get_user_vote(self.conn(), id_vote, id_user).await
    }

    async fn get_user_vote_choices(&self, id_user_vote: Uuid) -> anyhow::Result<Vec<Uuid>> {
        model::get_user_vote_choices(self.conn(), id_user_vote).await
    }

    async fn add_ballot(&self, id_vote: Uuid, id_user: Uuid, choices: &[VoteItem], now: DateTime<Utc>) -> anyhow::Result<bool> {
        model::add_ballot(self.conn(), id_vote, id_user, choices, now).await
    }

    async fn tally_vote(&self, id_vote: Uuid) -> anyhow::Result<Vec<Tally>> {
        model::tally_vote(self.conn(), id_vote).await
    }
}

#[async_trait]
impl AccountStore for DBClient {
    async fn get_user(&self, id_user: Uuid) -> anyhow::Result<Option<User>> {
        model::get_user(self.conn(), id_user).await
    }

    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        model::get_user_by_email(self.conn(), email).await
    }

    async fn get_user_by_login(&self, email_or_card_id: &str) -> anyhow::Result<Option<User>> {
        model::get_user_by_login(self.conn(), email_or_card_id).await
    }

    async fn find_conflicting_user(&self, email: &str, phone_number: Option<&str>) -> anyhow::Result<Option<User>> {
        model::find_conflicting_user(self.conn(), email, phone_number).await
    }

    async fn add_user(&self, user: &User, code: &str) -> anyhow::Result<bool> {
        model::add_user(self.conn(), user, code).await
    }

    async fn get_verification(&self, id_user: Uuid) -> anyhow::Result<Option<EmailVerification>> {
        model::get_verification(self.conn(), id_user).await
    }

    async fn replace_verification(&self, id_user: Uuid, code: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        model::replace_verification(self.conn(), id_user, code, now).await
    }

    async fn mark_verified(&self, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
        model::mark_verified(self.conn(), id_user, now).await
    }

    async fn update_password(&self, id_user: Uuid, hashed_password: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        model::update_password(self.conn(), id_user, hashed_password, now).await
    }

    async fn set_fcm_token(&self, id_user: Uuid, token: &str, now: DateTime<Utc>) -> anyhow::Result<bool> {
        model::set_fcm_token(self.conn(), id_user, token, now).await
    }

    async fn add_session(&self, token: &str, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
        model::add_session(self.conn(), token, id_user, now).await
    }

    async fn get_session_user(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        model::get_session_user(self.conn(), token).await
    }
}
