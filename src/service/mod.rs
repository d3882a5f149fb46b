pub mod accounts;
pub mod voting;
