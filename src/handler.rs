use std::sync::Arc;

use crate::clock::Clock;
use crate::config::Config;
use crate::db::dbclient::DBClient;
use crate::db::store::{AccountStore, VoteStore};
use crate::service::accounts::AccountService;
use crate::service::voting::VotingService;
use crate::support::mailer::Mailer;
use crate::support::password::PasswordHasher;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub votes: Arc<VotingService>,
    pub accounts: Arc<AccountService>,
}

impl AppState {
    pub fn new(
        vote_store: Arc<dyn VoteStore>,
        account_store: Arc<dyn AccountStore>,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        Self {
            votes: Arc::new(VotingService::new(vote_store, clock.clone())),
            accounts: Arc::new(AccountService::new(account_store, hasher, mailer, clock, config.code_ttl)),
        }
    }

    pub fn from_db(
        db_client: DBClient,
        hasher: Arc<dyn PasswordHasher>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let db_client = Arc::new(db_client);

        Self::new(db_client.clone(), db_client, hasher, mailer, clock, config)
    }
}
