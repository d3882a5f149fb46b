use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};

const SESSION_TOKEN_LEN: usize = 48;

/// Six-digit code mailed for email verification and password reset.
pub fn verification_code() -> String {
    thread_rng().gen_range(100000..=999999).to_string()
}

pub fn session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LEN)
        .map(char::from)
        .collect()
}
