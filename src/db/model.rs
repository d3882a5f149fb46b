use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::{query, query_as, query_scalar, PgPool};
use uuid::Uuid;

use crate::db::schema::{EmailVerification, Tally, User, UserVote, Vote, VoteItem};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

pub async fn list_open_votes(conn: &PgPool, now: DateTime<Utc>) -> anyhow::Result<Vec<Vote>> {
    let mut stream = query_as::<_, Vote>(
        "SELECT id, name, start_date, end_date FROM votes
         WHERE start_date <= $1 AND end_date >= $1
         ORDER BY end_date, id;")
        .bind(now)
        .fetch(conn);

    let mut result = Vec::new();
    while let Some(row) = stream.try_next().await? {
        result.push(row);
    }

    Ok(result)
}

pub async fn get_vote(conn: &PgPool, id_vote: Uuid) -> anyhow::Result<Option<Vote>> {
    let r = query_as::<_, Vote>("SELECT id, name, start_date, end_date FROM votes WHERE id=$1;")
        .bind(id_vote)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

pub async fn get_vote_items(conn: &PgPool, id_vote: Uuid) -> anyhow::Result<Vec<VoteItem>> {
    let r = query_as::<_, VoteItem>("SELECT id, vote_id, item FROM votes_items WHERE vote_id=$1 ORDER BY item, id;")
        .bind(id_vote)
        .fetch_all(conn)
        .await?;

    Ok(r)
}

pub async fn get_user_vote(conn: &PgPool, id_vote: Uuid, id_user: Uuid) -> anyhow::Result<Option<UserVote>> {
    let r = query_as::<_, UserVote>(
        "SELECT id, user_id, vote_id, time_created FROM user_votes WHERE vote_id=$1 AND user_id=$2;")
        .bind(id_vote)
        .bind(id_user)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

/// Item ids chosen on a ballot. Rows also carry the item label for readers that still match on text.
pub async fn get_user_vote_choices(conn: &PgPool, id_user_vote: Uuid) -> anyhow::Result<Vec<Uuid>> {
    let r = query_scalar::<_, Uuid>("SELECT vote_item_id FROM user_votes_items WHERE user_vote_id=$1;")
        .bind(id_user_vote)
        .fetch_all(conn)
        .await?;

    Ok(r)
}

/// Inserts the ballot and its items in one transaction. Returns `false` when the
/// user already holds a ballot for this vote; nothing is written in that case.
pub async fn add_ballot(
    conn: &PgPool,
    id_vote: Uuid,
    id_user: Uuid,
    choices: &[VoteItem],
    now: DateTime<Utc>,
) -> anyhow::Result<bool> {
    let mut tx = conn.begin().await?;

    let id_user_vote = Uuid::new_v4();
    let r = query("INSERT INTO user_votes (id, user_id, vote_id, time_created) VALUES ($1, $2, $3, $4);")
        .bind(id_user_vote)
        .bind(id_user)
        .bind(id_vote)
        .bind(now)
        .execute(&mut *tx)
        .await;

    match r {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Ok(false),
        Err(e) => return Err(e.into()),
    }

    for choice in choices {
        query("INSERT INTO user_votes_items (id, user_vote_id, vote_item_id, item) VALUES ($1, $2, $3, $4);")
            .bind(Uuid::new_v4())
            .bind(id_user_vote)
            .bind(choice.id)
            .bind(&choice.item)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(true)
}

pub async fn tally_vote(conn: &PgPool, id_vote: Uuid) -> anyhow::Result<Vec<Tally>> {
    let r = query_as::<_, Tally>("SELECT item_id, item, votes_count FROM vote_results($1);")
        .bind(id_vote)
        .fetch_all(conn)
        .await?;

    Ok(r)
}

//

const USER_COLUMNS: &str = "id, name, email, phone_number, card_id, role, purpose, date_of_birth, \
    hashed_password, status, is_verified, fcm_token, created_at, updated_at";

pub async fn get_user(conn: &PgPool, id_user: Uuid) -> anyhow::Result<Option<User>> {
    let r = query_as::<_, User>(&format!("SELECT {} FROM users WHERE id=$1;", USER_COLUMNS))
        .bind(id_user)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

pub async fn get_user_by_email(conn: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    let r = query_as::<_, User>(&format!("SELECT {} FROM users WHERE email=$1;", USER_COLUMNS))
        .bind(email)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

pub async fn get_user_by_login(conn: &PgPool, email_or_card_id: &str) -> anyhow::Result<Option<User>> {
    let r = query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email=$1 OR card_id=$1 ORDER BY (email=$1) DESC LIMIT 1;", USER_COLUMNS))
        .bind(email_or_card_id)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

pub async fn find_conflicting_user(conn: &PgPool, email: &str, phone_number: Option<&str>) -> anyhow::Result<Option<User>> {
    let r = query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE email=$1 OR ($2::TEXT IS NOT NULL AND phone_number=$2)
         ORDER BY (email=$1) DESC LIMIT 1;", USER_COLUMNS))
        .bind(email)
        .bind(phone_number)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

/// Creates the user together with its first verification code. Returns `false`
/// if a unique column (email, phone number, card id) is already taken.
pub async fn add_user(conn: &PgPool, user: &User, code: &str) -> anyhow::Result<bool> {
    let mut tx = conn.begin().await?;

    let r = query(&format!(
        "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14);", USER_COLUMNS))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(&user.card_id)
        .bind(&user.role)
        .bind(&user.purpose)
        .bind(user.date_of_birth)
        .bind(&user.hashed_password)
        .bind(&user.status)
        .bind(user.is_verified)
        .bind(&user.fcm_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await;

    match r {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => return Ok(false),
        Err(e) => return Err(e.into()),
    }

    query("INSERT INTO email_verifications (user_id, code, created_at) VALUES ($1, $2, $3);")
        .bind(user.id)
        .bind(code)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(true)
}

pub async fn get_verification(conn: &PgPool, id_user: Uuid) -> anyhow::Result<Option<EmailVerification>> {
    let r = query_as::<_, EmailVerification>("SELECT code, created_at FROM email_verifications WHERE user_id=$1;")
        .bind(id_user)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}

pub async fn replace_verification(conn: &PgPool, id_user: Uuid, code: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    query(
        "INSERT INTO email_verifications (user_id, code, created_at) VALUES ($1, $2, $3)
         ON CONFLICT (user_id) DO UPDATE SET code=EXCLUDED.code, created_at=EXCLUDED.created_at;")
        .bind(id_user)
        .bind(code)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn mark_verified(conn: &PgPool, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
    let mut tx = conn.begin().await?;

    query("UPDATE users SET is_verified=TRUE, updated_at=$2 WHERE id=$1;")
        .bind(id_user)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    query("DELETE FROM email_verifications WHERE user_id=$1;")
        .bind(id_user)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

/// Sets a new password hash, consuming any outstanding code and signing out every session.
pub async fn update_password(conn: &PgPool, id_user: Uuid, hashed_password: &str, now: DateTime<Utc>) -> anyhow::Result<()> {
    let mut tx = conn.begin().await?;

    query("UPDATE users SET hashed_password=$2, updated_at=$3 WHERE id=$1;")
        .bind(id_user)
        .bind(hashed_password)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    query("DELETE FROM email_verifications WHERE user_id=$1;")
        .bind(id_user)
        .execute(&mut *tx)
        .await?;

    query("DELETE FROM sessions WHERE user_id=$1;")
        .bind(id_user)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(())
}

pub async fn set_fcm_token(conn: &PgPool, id_user: Uuid, token: &str, now: DateTime<Utc>) -> anyhow::Result<bool> {
    let r = query("UPDATE users SET fcm_token=$2, updated_at=$3 WHERE id=$1;")
        .bind(id_user)
        .bind(token)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(r.rows_affected() > 0)
}

pub async fn add_session(conn: &PgPool, token: &str, id_user: Uuid, now: DateTime<Utc>) -> anyhow::Result<()> {
    query("INSERT INTO sessions (token, user_id, created_at) VALUES ($1, $2, $3);")
        .bind(token)
        .bind(id_user)
        .bind(now)
        .execute(conn)
        .await?;

    Ok(())
}

pub async fn get_session_user(conn: &PgPool, token: &str) -> anyhow::Result<Option<Uuid>> {
    let r = query_scalar::<_, Uuid>("SELECT user_id FROM sessions WHERE token=$1;")
        .bind(token)
        .fetch_optional(conn)
        .await?;

    Ok(r)
}
