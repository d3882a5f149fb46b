use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: Uuid,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Vote {
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.end_date
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VoteItem {
    pub id: Uuid,
    pub vote_id: Uuid,
    pub item: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserVote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vote_id: Uuid,
    pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tally {
    pub item_id: Uuid,
    pub item: String,
    pub votes_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Member,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Guest => "guest",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Pending,
    Approved,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub card_id: Option<String>,
    pub role: String,
    pub purpose: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub hashed_password: String,
    pub status: String,
    pub is_verified: bool,
    pub fcm_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_approved(&self) -> bool {
        self.status == UserStatus::Approved.as_str()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EmailVerification {
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn matches(&self, code: &str, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.code == code.trim() && now - self.created_at <= ttl
    }
}
