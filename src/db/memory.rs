use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use uuid::Uuid;

use crate::db::schema::{EmailVerification, Tally, User, UserVote, Vote, VoteItem};
use crate::db::store::{AccountStore, VoteStore};

/// A `user_votes_items` row.
#[derive(Clone)]
struct BallotItem {
    user_vote_id: Uuid,
    vote_item_id: Uuid,
    item: String,
}

#[derive(Default)]
struct Tables {
    votes: Vec<Vote>,
    vote_items: Vec<VoteItem>,
    user_votes: Vec<UserVote>,
    user_vote_items: Vec<BallotItem>,
    users: Vec<User>,
    verifications: HashMap<Uuid, EmailVerification>,
    sessions: HashMap<String, Uuid>,
}

/// Store used by unit tests; mirrors the Postgres constraints that the services rely on.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_inserts: Mutex<bool>,
}

impl MemoryStore {
    pub fn add_vote(&self, name: &str, start_date: DateTime<Utc>, end_date: DateTime<Utc>, items: &[&str]) -> (Vote, Vec<VoteItem>) {
        let vote = Vote {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            start_date,
            end_date,
        };
        let items = items.iter()
            .map(|item| VoteItem {
                id: Uuid::new_v4(),
                vote_id: vote.id,
                item: item.to_string(),
            })
            .collect::<Vec<_>>();

        let mut t = self.tables.lock().unwrap();
        t.votes.push(vote.clone());
        t.vote_items.extend(items.iter().cloned());

        (vote, items)
    }

    pub fn ballot_count(&self) -> usize {
        self.tables.lock().unwrap().user_votes.len()
    }

    pub fn ballot_item_count(&self) -> usize {
        self.tables.lock().unwrap().user_vote_items.len()
    }

    /// Labels stored on the ballot items of (vote, user), sorted.
    pub fn ballot_labels(&self, id_vote: Uuid, id_user: Uuid) -> Vec<String> {
        let t = self.tables.lock().unwrap();
        let ballot = match t.user_votes.iter().find(|v| v.vote_id == id_vote && v.user_id == id_user) {
            None => return Vec::new(),
            Some(v) => v.id,
        };
        t.user_vote_items.iter()
            .filter(|v| v.user_vote_id == ballot)
            .map(|v| v.item.clone())
            .sorted()
            .collect()
    }

    pub fn session_count(&self, id_user: Uuid) -> usize {
        self.tables.lock().unwrap().sessions.values().filter(|v| **v == id_user).count()
    }

    pub fn set_status(&self, id_user: Uuid, status: &str) {
        let mut t = self.tables.lock().unwrap();
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id_user) {
            u.status = status.to_owned();
        }
    }

    pub fn set_verification_time(&self, id_user: Uuid, created_at: DateTime<Utc>) {
        let mut t = self.tables.lock().unwrap();
        if let Some(v) = t.verifications.get_mut(&id_user) {
            v.created_at = created_at;
        }
    }

    /// Makes every later write fail midway, after the parent row was staged.
    pub fn fail_inserts(&self) {
        *self.fail_inserts.lock().unwrap() = true;
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn list_open_votes(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<Vote>> {
        let t = self.tables.lock().unwrap();
        Ok(t.votes.iter().filter(|v| v.start_date <= now && now <= v.end_date).cloned().collect())
    }

    async fn get_vote(&self, id_vote: Uuid) -> anyhow::Result<Option<Vote>> {
        let t = self.tables.lock().unwrap();
        Ok(t.votes.iter().find(|v| v.id == id_vote).cloned())
    }

    async fn get_vote_items(&self, id_vote: Uuid) -> anyhow::Result<Vec<VoteItem>> {
        let t = self.tables.lock().unwrap();
        Ok(t.vote_items.iter().filter(|v| v.vote_id == id_vote).cloned().collect())
    }

    async fn get_user_vote(&self, id_vote: Uuid, id_user: Uuid) -> anyhow::Result<Option<UserVote>> {
        let t = self.tables.lock().unwrap();
        Ok(t.user_votes.iter().find(|v| v.vote_id == id_vote && v.user_id == id_user).cloned())
    }

    async fn get_user_vote_choices(&self, id_user_vote: Uuid) -> anyhow::Result<Vec<Uuid>> {
        let t = self.tables.lock().unwrap();
        Ok(t.user_vote_items.iter().filter(|v| v.user_vote_id == id_user_vote).map(|v| v.vote_item_id).collect())
    }

    async fn add_ballot(&self, id_vote: Uuid, id_user: Uuid, choices: &[VoteItem], now: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().unwrap();

        if t.user_votes.iter().any(|v| v.vote_id == id_vote && v.user_id == id_user) {
            return Ok(false);
        }

        let ballot = UserVote {
            id: Uuid::new_v4(),
            user_id: id_user,
            vote_id: id_vote,
            time_created: now,
        };
        let items = choices.iter()
            .map(|c| BallotItem {
                user_vote_id: ballot.id,
                vote_item_id: c.id,
                item: c.item.clone(),
            })
            .collect::<Vec<_>>();

        // Staged rows are dropped on failure, like a rolled back transaction.
        if *self.fail_inserts.lock().unwrap() {
            anyhow::bail!("simulated storage failure");
        }

        t.user_votes.push(ballot);
        t.user_vote_items.extend(items);

        Ok(true)
    }

    async fn tally_vote(&self, id_vote: Uuid) -> anyhow::Result<Vec<Tally>> {
        let t = self.tables.lock().unwrap();

        let tallies = t.vote_items.iter()
            .filter(|v| v.vote_id == id_vote)
            .sorted_by(|a, b| a.item.cmp(&b.item).then(a.id.cmp(&b.id)))
            .map(|v| Tally {
                item_id: v.id,
                item: v.item.clone(),
                votes_count: t.user_vote_items.iter().filter(|c| c.vote_item_id == v.id).count() as i64,
            })
            .collect();

        Ok(tallies)
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_user(&self, id_user: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id_user).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_login(&self, email_or_card_id: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        let by_email = t.users.iter().find(|u| u.email == email_or_card_id);
        let by_card = t.users.iter().find(|u| u.card_id.as_deref() == Some(email_or_card_id));
        Ok(by_email.or(by_card).cloned())
    }

    async fn find_conflicting_user(&self, email: &str, phone_number: Option<&str>) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().unwrap();
        let by_email = t.users.iter().find(|u| u.email == email);
        let by_phone = t.users.iter().find(|u| phone_number.is_some() && u.phone_number.as_deref() == phone_number);
        Ok(by_email.or(by_phone).cloned())
    }

    async fn add_user(&self, user: &User, code: &str) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().unwrap();

        let taken = t.users.iter().any(|u| {
            u.email == user.email
                || (user.phone_number.is_some() && u.phone_number == user.phone_number)
                || (user.card_id.is_some() && u.card_id == user.card_id)
        });
        if taken {
            return Ok(false);
        }

        if *self.fail_inserts.lock().unwrap() {
            anyhow::bail!("simulated storage failure");
        }

        t.users.push(user.clone());
        t.verifications.insert(user.id, EmailVerification {
            code: code.to_owned(),
            created_at: user.created_at,
        });

        Ok(true)
    }

    async fn get_verification(&self, id_user: Uuid) -> anyhow::Result<Option<EmailVerification>> {
        let t = self.tables.lock().unwrap();
        Ok(t.verifications.get(&id_user).cloned())
    }

    async fn replace_verification(&self, id_user: Uuid, code: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut t = self.tables.lock().unwrap();
        t.verifications.insert(id_user, EmailVerification {
            code: code.to_owned(),
            created_at: now,
        });
        Ok(())
    }

    async fn mark_verified(&self, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut t = self.tables.lock().unwrap();
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id_user) {
            u.is_verified = true;
            u.updated_at = now;
        }
        t.verifications.remove(&id_user);
        Ok(())
    }

    async fn update_password(&self, id_user: Uuid, hashed_password: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut t = self.tables.lock().unwrap();
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id_user) {
            u.hashed_password = hashed_password.to_owned();
            u.updated_at = now;
        }
        t.verifications.remove(&id_user);
        t.sessions.retain(|_, v| *v != id_user);
        Ok(())
    }

    async fn set_fcm_token(&self, id_user: Uuid, token: &str, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut t = self.tables.lock().unwrap();
        match t.users.iter_mut().find(|u| u.id == id_user) {
            None => Ok(false),
            Some(u) => {
                u.fcm_token = Some(token.to_owned());
                u.updated_at = now;
                Ok(true)
            }
        }
    }

    async fn add_session(&self, token: &str, id_user: Uuid, _now: DateTime<Utc>) -> anyhow::Result<()> {
        let mut t = self.tables.lock().unwrap();
        t.sessions.insert(token.to_owned(), id_user);
        Ok(())
    }

    async fn get_session_user(&self, token: &str) -> anyhow::Result<Option<Uuid>> {
        let t = self.tables.lock().unwrap();
        Ok(t.sessions.get(token).copied())
    }
}
