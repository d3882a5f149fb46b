use std::collections::HashSet;
use std::sync::Arc;

use evlog::meta;
use itertools::Itertools;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::schema::{Tally, Vote, VoteItem};
use crate::db::store::VoteStore;
use crate::helpers::error::ApiError;
use crate::helpers::response::Message;
use crate::runtime::get_logger;

#[derive(Serialize)]
pub struct VoteList {
    pub votes: Vec<Vote>,
}

#[derive(Serialize)]
pub struct VoteDetail {
    pub votename: String,
    #[serde(rename = "selectedList")]
    pub selected_list: Vec<VoteItem>,
}

#[derive(Serialize)]
pub struct VoteResult {
    #[serde(flatten)]
    pub tally: Tally,
    #[serde(rename = "isUserVoted")]
    pub is_user_voted: bool,
}

#[derive(Serialize)]
pub struct VoteResults {
    pub results: Vec<VoteResult>,
}

pub struct VotingService {
    store: Arc<dyn VoteStore>,
    clock: Arc<dyn Clock>,
}

impl VotingService {
    pub fn new(store: Arc<dyn VoteStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub async fn list_open_votes(&self) -> Result<VoteList, ApiError> {
        let votes = self.store.list_open_votes(self.clock.now()).await?;

        Ok(VoteList { votes })
    }

    /// Items of a vote the user can still cast a ballot for.
    pub async fn get_vote_detail(&self, id_vote: Uuid, id_user: Uuid) -> Result<VoteDetail, ApiError> {
        let vote = match self.store.get_vote(id_vote).await? {
            Some(v) if !v.has_ended(self.clock.now()) => v,
            Some(_) => {
                get_logger().info("User requested a vote that has ended.", meta! {
                    "VoteID" => id_vote,
                    "UserID" => id_user,
                });
                return Err(ApiError::not_found("Vote not found"));
            }
            None => return Err(ApiError::not_found("Vote not found")),
        };

        if self.store.get_user_vote(id_vote, id_user).await?.is_some() {
            get_logger().info("User requested a vote they already voted on.", meta! {
                "VoteID" => id_vote,
                "UserID" => id_user,
            });
            return Err(ApiError::conflict("You voted before"));
        }

        let items = self.store.get_vote_items(id_vote).await?;

        Ok(VoteDetail {
            votename: vote.name,
            selected_list: items,
        })
    }

    pub async fn submit_vote(&self, id_vote: Uuid, id_user: Uuid, chosen: &[Uuid]) -> Result<Message, ApiError> {
        let now = self.clock.now();

        let vote = match self.store.get_vote(id_vote).await? {
            None => return Err(ApiError::not_found("Vote not found")),
            Some(v) => v,
        };

        if vote.has_ended(now) {
            get_logger().info("User attempted to vote after the voting period ended.", meta! {
                "VoteID" => vote.id,
                "VoteName" => vote.name,
                "UserID" => id_user,
            });
            return Err(ApiError::conflict("Voting period has ended"));
        }

        if !vote.has_started(now) {
            get_logger().info("User attempted to vote before the voting period started.", meta! {
                "VoteID" => vote.id,
                "VoteName" => vote.name,
                "UserID" => id_user,
            });
            return Err(ApiError::conflict("Voting period has not started"));
        }

        if self.store.get_user_vote(id_vote, id_user).await?.is_some() {
            get_logger().info("User attempted to vote twice.", meta! {
                "VoteID" => vote.id,
                "UserID" => id_user,
            });
            return Err(ApiError::conflict("You already voted for this vote"));
        }

        //

        if chosen.is_empty() {
            return Err(ApiError::bad_request("At least one item must be selected"));
        }

        if chosen.iter().unique().count() != chosen.len() {
            get_logger().info("User chose the same item more than once.", meta! {
                "VoteID" => vote.id,
                "UserID" => id_user,
            });
            return Err(ApiError::bad_request("Each item may only be selected once"));
        }

        let items = self.store.get_vote_items(id_vote).await?;

        let mut choices = Vec::with_capacity(chosen.len());
        for id_item in chosen {
            match items.iter().find(|v| v.id == *id_item) {
                Some(v) => choices.push(v.clone()),
                None => {
                    get_logger().info("User chose an item that does not belong to the vote.", meta! {
                        "VoteID" => vote.id,
                        "UserID" => id_user,
                        "ItemID" => id_item,
                    });
                    return Err(ApiError::bad_request("One or more selected items are invalid"));
                }
            }
        }

        //

        let added = self.store.add_ballot(id_vote, id_user, &choices, now).await?;
        if !added {
            // Lost a race with a concurrent submission; the unique constraint caught it.
            return Err(ApiError::conflict("You already voted for this vote"));
        }

        get_logger().info("Ballot cast.", meta! {
            "VoteID" => vote.id,
            "UserID" => id_user,
            "Choices" => choices.iter().map(|v| v.item.as_str()).join(", "),
        });

        Ok(Message::new("Vote submitted successfully"))
    }

    pub async fn compute_vote_result(&self, id_vote: Uuid, id_user: Uuid) -> Result<VoteResults, ApiError> {
        if self.store.get_vote(id_vote).await?.is_none() {
            return Err(ApiError::not_found("Vote not found"));
        }

        let tallies = self.store.tally_vote(id_vote).await?;

        let selected = match self.store.get_user_vote(id_vote, id_user).await? {
            None => HashSet::new(),
            Some(ballot) => self.store.get_user_vote_choices(ballot.id).await?
                .into_iter()
                .collect::<HashSet<_>>(),
        };

        let results = tallies.into_iter()
            .map(|tally| VoteResult {
                is_user_voted: selected.contains(&tally.item_id),
                tally,
            })
            .collect();

        Ok(VoteResults { results })
    }
}
