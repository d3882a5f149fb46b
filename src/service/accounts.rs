use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use evlog::meta;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::schema::{Role, User, UserStatus};
use crate::db::store::AccountStore;
use crate::helpers::error::ApiError;
use crate::helpers::response::Message;
use crate::runtime::get_logger;
use crate::support::codes::{session_token, verification_code};
use crate::support::mailer::Mailer;
use crate::support::password::PasswordHasher;

const MIN_PASSWORD_LEN: usize = 8;

static VALIDATE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub card_id: Option<String>,
    pub purpose: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub user_id: Uuid,
    pub code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_card_id: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct FcmTokenRequest {
    pub token: String,
}

#[derive(Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: Arc<dyn PasswordHasher>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    code_ttl: Duration,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        code_ttl: Duration,
    ) -> Self {
        Self { store, hasher, mailer, clock, code_ttl }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<SignupResponse, ApiError> {
        let name = req.name.trim().to_owned();
        let email = normalize_email(&req.email);
        let phone_number = non_empty(req.phone_number);
        let card_id = non_empty(req.card_id);
        let purpose = non_empty(req.purpose);

        if name.is_empty() {
            return Err(ApiError::bad_request("Name is required"));
        }

        if !VALIDATE_EMAIL.is_match(&email) {
            return Err(ApiError::bad_request(format!("Email '{}' is invalid", email)));
        }

        check_password(&req.password)?;

        let role = match Role::parse(req.role.trim()) {
            Some(v) => v,
            None => return Err(ApiError::bad_request(format!("Role must be 'member' or 'guest'; got '{}'", req.role))),
        };

        if role == Role::Guest && purpose.is_none() {
            return Err(ApiError::bad_request("Guests must state the purpose of their visit"));
        }

        //

        if let Some(existing) = self.store.find_conflicting_user(&email, phone_number.as_deref()).await? {
            get_logger().info("Attempted to sign up with an email or phone number already in use.", meta! {
                "Email" => email,
            });
            if existing.email == email {
                return Err(ApiError::conflict("Email is already in use"));
            }
            return Err(ApiError::conflict("Phone number is already in use"));
        }

        let hashed_password = self.hasher.hash(&req.password).await?;
        let now = self.clock.now();
        let code = verification_code();

        let user = User {
            id: Uuid::new_v4(),
            name,
            email,
            phone_number,
            card_id,
            role: role.as_str().to_owned(),
            purpose: if role == Role::Guest { purpose } else { None },
            date_of_birth: req.date_of_birth,
            hashed_password,
            status: UserStatus::Pending.as_str().to_owned(),
            is_verified: false,
            fcm_token: None,
            created_at: now,
            updated_at: now,
        };

        if !self.store.add_user(&user, &code).await? {
            return Err(ApiError::conflict("Email, phone number or card ID is already in use"));
        }

        self.mailer.send(&user.email, "Email Verification", &format!("Your verification code is {}", code)).await?;

        get_logger().info("User signed up.", meta! {
            "UserID" => user.id,
            "Role" => user.role,
        });

        Ok(SignupResponse {
            message: "Signed up successfully; please verify your email".to_owned(),
            user_id: user.id,
        })
    }

    pub async fn verify_email(&self, req: VerifyEmailRequest) -> Result<Message, ApiError> {
        let user = match self.store.get_user(req.user_id).await? {
            None => return Err(ApiError::not_found("User not found")),
            Some(v) => v,
        };

        if !self.code_matches(user.id, &req.code).await? {
            get_logger().info("Invalid email verification code.", meta! {
                "UserID" => user.id,
            });
            return Err(ApiError::bad_request("Invalid verification code"));
        }

        self.store.mark_verified(user.id, self.clock.now()).await?;

        Ok(Message::new("Email verified"))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        let login = req.email_or_card_id.trim();
        let login = if login.contains('@') { normalize_email(login) } else { login.to_owned() };

        let user = match self.store.get_user_by_login(&login).await? {
            None => return Err(ApiError::unauthorized("Invalid email/card ID or password")),
            Some(v) => v,
        };

        if !self.hasher.verify(&req.password, &user.hashed_password).await? {
            get_logger().info("Failed login attempt.", meta! {
                "UserID" => user.id,
            });
            return Err(ApiError::unauthorized("Invalid email/card ID or password"));
        }

        if !user.is_approved() {
            return Err(ApiError::forbidden("Account has not been approved yet; please wait for approval"));
        }

        if !user.is_verified {
            return Err(ApiError::forbidden("Please verify your email"));
        }

        let token = session_token();
        self.store.add_session(&token, user.id, self.clock.now()).await?;

        get_logger().info("User logged in.", meta! {
            "UserID" => user.id,
        });

        Ok(LoginResponse {
            message: "Logged in successfully".to_owned(),
            token,
        })
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<Uuid, ApiError> {
        match self.store.get_session_user(token).await? {
            Some(v) => Ok(v),
            None => Err(ApiError::unauthorized("Invalid session token")),
        }
    }

    pub async fn register_fcm_token(&self, id_user: Uuid, req: FcmTokenRequest) -> Result<Message, ApiError> {
        let token = req.token.trim();
        if token.is_empty() {
            return Err(ApiError::bad_request("Token is required"));
        }

        if !self.store.set_fcm_token(id_user, token, self.clock.now()).await? {
            return Err(ApiError::not_found("User not found"));
        }

        Ok(Message::new("Token saved"))
    }

    pub async fn send_reset_code(&self, req: EmailRequest) -> Result<Message, ApiError> {
        let user = self.user_by_email(&req.email).await?;

        if !user.is_verified || !user.is_approved() {
            return Err(ApiError::bad_request("Account is not active or email is not verified"));
        }

        let code = verification_code();
        self.store.replace_verification(user.id, &code, self.clock.now()).await?;

        self.mailer.send(&user.email, "Password Reset Code", &format!(
            "Your reset code is: {}\nIt will expire in {}.", code, describe_ttl(self.code_ttl)
        )).await?;

        get_logger().info("Password reset code sent.", meta! {
            "UserID" => user.id,
        });

        Ok(Message::new("A reset code was sent to your email"))
    }

    pub async fn verify_reset_code(&self, req: VerifyCodeRequest) -> Result<Message, ApiError> {
        let user = match self.store.get_user_by_email(&normalize_email(&req.email)).await? {
            None => return Err(ApiError::bad_request("Invalid code")),
            Some(v) => v,
        };

        if !self.code_matches(user.id, &req.code).await? {
            return Err(ApiError::bad_request("Invalid code"));
        }

        Ok(Message::new("Code verified"))
    }

    pub async fn reset_password(&self, req: ResetPasswordRequest) -> Result<Message, ApiError> {
        let user = self.user_by_email(&req.email).await?;

        check_password(&req.new_password)?;

        if !self.code_matches(user.id, &req.code).await? {
            get_logger().info("Invalid password reset code.", meta! {
                "UserID" => user.id,
            });
            return Err(ApiError::bad_request("Invalid reset code"));
        }

        let hashed_password = self.hasher.hash(&req.new_password).await?;
        self.store.update_password(user.id, &hashed_password, self.clock.now()).await?;

        get_logger().info("Password reset.", meta! {
            "UserID" => user.id,
        });

        Ok(Message::new("Password changed successfully"))
    }

    pub async fn resend_verification_code(&self, req: EmailRequest) -> Result<Message, ApiError> {
        let user = self.user_by_email(&req.email).await?;

        if user.is_verified {
            return Err(ApiError::bad_request("Email is already verified"));
        }

        let code = verification_code();
        self.store.replace_verification(user.id, &code, self.clock.now()).await?;

        self.mailer.send(&user.email, "Email Verification", &format!("Your new verification code is {}", code)).await?;

        Ok(Message::new("A new code was sent to your email"))
    }

    async fn user_by_email(&self, email: &str) -> Result<User, ApiError> {
        match self.store.get_user_by_email(&normalize_email(email)).await? {
            Some(v) => Ok(v),
            None => Err(ApiError::not_found("User not found")),
        }
    }

    async fn code_matches(&self, id_user: Uuid, code: &str) -> anyhow::Result<bool> {
        let record = self.store.get_verification(id_user).await?;

        Ok(match record {
            None => false,
            Some(v) => v.matches(code, self.clock.now(), self.code_ttl),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!("Password must be at least {} characters", MIN_PASSWORD_LEN)));
    }
    Ok(())
}

fn describe_ttl(ttl: Duration) -> String {
    let minutes = ttl.num_minutes();
    match minutes {
        60 => "1 hour".to_owned(),
        m if m % 60 == 0 => format!("{} hours", m / 60),
        1 => "1 minute".to_owned(),
        m => format!("{} minutes", m),
    }
}
