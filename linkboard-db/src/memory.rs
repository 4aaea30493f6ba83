//! In-process [`LinkStore`], used when no database is configured and in tests.

use crate::store::{DbError, LinkStore, Result};
use async_trait::async_trait;
use linkboard_common::model::{
    Id,
    auth::{AuthTokenHash, Authentication},
    feed::{LinkFilter, LinkQuery},
    link::{CreateLink, Link, LinkMarker},
    user::{User, UserHandle, UserMarker},
};
use std::collections::{BTreeMap, BTreeSet};
use time::UtcDateTime;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Id<UserMarker>, User>,
    links: BTreeMap<Id<LinkMarker>, Link>,
    votes: BTreeMap<Id<LinkMarker>, BTreeSet<Id<UserMarker>>>,
    authentications: Vec<Authentication>,
    last_user_id: i32,
    last_link_id: i32,
}

fn next_id(last: &mut i32) -> Result<i32> {
    *last = last.checked_add(1).ok_or(DbError::IdsExhausted)?;
    Ok(*last)
}

impl Tables {
    fn insert_link(&mut self, link: &CreateLink, created_at: UtcDateTime) -> Result<Link> {
        if !self.users.contains_key(&link.author) {
            return Err(DbError::UnknownUser(link.author));
        }

        let link = Link {
            id: Id::new(next_id(&mut self.last_link_id)?),
            description: link.description.clone(),
            url: link.url.clone(),
            created_at,
            author_id: Some(link.author),
        };
        self.links.insert(link.id, link.clone());

        Ok(link)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, handle: UserHandle) -> Result<User> {
        let mut tables = self.tables.write().await;

        let user = User {
            id: Id::new(next_id(&mut tables.last_user_id)?),
            handle,
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    /// Removes a user. Their links stay, without an author.
    pub async fn delete_user(&self, user_id: Id<UserMarker>) {
        let mut tables = self.tables.write().await;

        tables.users.remove(&user_id);
        for link in tables.links.values_mut() {
            if link.author_id == Some(user_id) {
                link.author_id = None;
            }
        }
        for voters in tables.votes.values_mut() {
            voters.remove(&user_id);
        }
        tables
            .authentications
            .retain(|authentication| authentication.user != user_id);
    }

    /// Like [`LinkStore::create_link`], with a caller-chosen creation time.
    pub async fn insert_link_at(&self, link: &CreateLink, created_at: UtcDateTime) -> Result<Link> {
        self.tables.write().await.insert_link(link, created_at)
    }

    /// Records a vote. Voting twice for the same link has no further effect.
    pub async fn insert_vote(&self, link_id: Id<LinkMarker>, user_id: Id<UserMarker>) -> Result<()> {
        let mut tables = self.tables.write().await;

        if !tables.links.contains_key(&link_id) {
            return Err(DbError::UnknownLink(link_id));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(DbError::UnknownUser(user_id));
        }
        tables.votes.entry(link_id).or_default().insert(user_id);

        Ok(())
    }

    pub async fn insert_authentication(&self, authentication: Authentication) {
        self.tables.write().await.authentications.push(authentication);
    }
}

#[async_trait]
impl LinkStore for MemoryStore {
    async fn fetch_links(&self, query: &LinkQuery) -> Result<Vec<Link>> {
        let tables = self.tables.read().await;

        let mut links: Vec<&Link> = tables
            .links
            .values()
            .filter(|link| query.filter.as_ref().is_none_or(|filter| filter.matches(link)))
            .collect();
        links.sort_by(|a, b| query.compare(a, b));

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .take
            .map_or(usize::MAX, |take| usize::try_from(take).unwrap_or(usize::MAX));
        Ok(links
            .into_iter()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count_links(&self, filter: Option<&LinkFilter>) -> Result<u64> {
        let tables = self.tables.read().await;

        let count = tables
            .links
            .values()
            .filter(|link| filter.is_none_or(|filter| filter.matches(link)))
            .count();

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn fetch_link_author(&self, link_id: Id<LinkMarker>) -> Result<Option<User>> {
        let tables = self.tables.read().await;

        let author = tables
            .links
            .get(&link_id)
            .and_then(|link| link.author_id)
            .and_then(|author_id| tables.users.get(&author_id))
            .cloned();

        Ok(author)
    }

    async fn fetch_link_voters(&self, link_id: Id<LinkMarker>) -> Result<Vec<User>> {
        let tables = self.tables.read().await;

        let voters = tables
            .votes
            .get(&link_id)
            .into_iter()
            .flatten()
            .filter_map(|user_id| tables.users.get(user_id))
            .cloned()
            .collect();

        Ok(voters)
    }

    async fn create_link(&self, link: &CreateLink) -> Result<Link> {
        self.tables
            .write()
            .await
            .insert_link(link, UtcDateTime::now())
    }

    async fn fetch_authentication(
        &self,
        token_hash: &AuthTokenHash,
    ) -> Result<Option<Authentication>> {
        let tables = self.tables.read().await;

        let authentication = tables
            .authentications
            .iter()
            .find(|authentication| authentication.token_hash == *token_hash)
            .cloned();

        Ok(authentication)
    }
}
