pub mod codes;
pub mod mailer;
pub mod password;
