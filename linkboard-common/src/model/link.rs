use crate::model::{Id, user::UserMarker};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct LinkMarker;

/// A bookmarked URL. `id` and `created_at` are assigned by the data store.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Link {
    pub id: Id<LinkMarker>,
    pub description: String,
    pub url: String,
    pub created_at: UtcDateTime,
    /// `None` for links whose author is unknown or was deleted.
    pub author_id: Option<Id<UserMarker>>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct CreateLink {
    pub description: String,
    pub url: String,
    pub author: Id<UserMarker>,
}
