//! Arguments of the link feed and the query they resolve to.
//!
//! [`FeedArgs`] is what a client sent, kept verbatim so it can be turned into a
//! stable cache id. [`LinkQuery`] is the validated form handed to the data store.

use crate::model::link::Link;
use serde::{Serialize, Serializer, ser::SerializeMap};
use std::cmp::Ordering;
use thiserror::Error;

/// Prefix separating feed ids from any other result ids handed to clients.
pub const FEED_ID_NAMESPACE: &str = "main-feed";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum FeedArgsError {
    #[error("`skip` must not be negative, got {0}")]
    NegativeSkip(i32),
    #[error("`take` must not be negative, got {0}")]
    NegativeTake(i32),
    #[error("An order directive must name a field")]
    EmptyOrderDirective,
    #[error("An order directive must name exactly one field, got {0}")]
    CompositeOrderDirective(usize),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum LinkOrderField {
    Description,
    Url,
    CreatedAt,
}

/// A single sort directive, serialized as `{"<field>": "<direction>"}`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct LinkOrder {
    pub field: LinkOrderField,
    pub direction: SortDirection,
}

/// Arguments of one feed request, exactly as supplied.
///
/// Absent arguments are skipped during serialization, which keeps
/// [`FeedArgs::cache_id`] identical for requests that omit the same arguments.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedArgs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<Vec<LinkOrder>>,
}

/// Non-empty text a link's description or url has to contain.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct LinkFilter(String);

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct LinkQuery {
    pub filter: Option<LinkFilter>,
    pub order_by: Vec<LinkOrder>,
    pub skip: u32,
    pub take: Option<u32>,
}

impl SortDirection {
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

impl LinkOrderField {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            LinkOrderField::Description => "description",
            LinkOrderField::Url => "url",
            LinkOrderField::CreatedAt => "createdAt",
        }
    }
}

impl LinkOrder {
    #[must_use]
    pub fn new(field: LinkOrderField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Builds a directive from the per-field slots of an order input, of which exactly one may be set.
    pub fn from_fields(
        description: Option<SortDirection>,
        url: Option<SortDirection>,
        created_at: Option<SortDirection>,
    ) -> Result<Self, FeedArgsError> {
        let mut set = [
            (LinkOrderField::Description, description),
            (LinkOrderField::Url, url),
            (LinkOrderField::CreatedAt, created_at),
        ]
        .into_iter()
        .filter_map(|(field, direction)| direction.map(|direction| Self::new(field, direction)));

        match (set.next(), set.count()) {
            (None, _) => Err(FeedArgsError::EmptyOrderDirective),
            (Some(order), 0) => Ok(order),
            (Some(_), rest) => Err(FeedArgsError::CompositeOrderDirective(rest + 1)),
        }
    }

    #[must_use]
    pub fn compare(self, a: &Link, b: &Link) -> Ordering {
        let ordering = match self.field {
            LinkOrderField::Description => a.description.cmp(&b.description),
            LinkOrderField::Url => a.url.cmp(&b.url),
            LinkOrderField::CreatedAt => a.created_at.cmp(&b.created_at),
        };

        self.direction.apply(ordering)
    }
}

impl Serialize for LinkOrder {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.field.name(), &self.direction)?;
        map.end()
    }
}

impl FeedArgs {
    /// Deterministic id of the feed these arguments produce.
    pub fn cache_id(&self) -> Result<String, serde_json::Error> {
        let args = serde_json::to_string(self)?;
        Ok(format!("{FEED_ID_NAMESPACE}:{args}"))
    }

    pub fn to_query(&self) -> Result<LinkQuery, FeedArgsError> {
        let skip = match self.skip {
            Some(skip) => u32::try_from(skip).map_err(|_| FeedArgsError::NegativeSkip(skip))?,
            None => 0,
        };
        let take = self
            .take
            .map(|take| u32::try_from(take).map_err(|_| FeedArgsError::NegativeTake(take)))
            .transpose()?;

        Ok(LinkQuery {
            filter: self.filter.clone().and_then(LinkFilter::new),
            order_by: self.order_by.clone().unwrap_or_default(),
            skip,
            take,
        })
    }
}

impl LinkFilter {
    /// Returns `None` for empty text, which filters nothing.
    #[must_use]
    pub fn new(text: String) -> Option<Self> {
        (!text.is_empty()).then_some(Self(text))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn matches(&self, link: &Link) -> bool {
        link.description.contains(&self.0) || link.url.contains(&self.0)
    }
}

impl LinkQuery {
    /// Total order of the feed: the directives in sequence, then ascending id.
    #[must_use]
    pub fn compare(&self, a: &Link, b: &Link) -> Ordering {
        self.order_by
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{
        Id,
        feed::{FeedArgs, FeedArgsError, LinkFilter, LinkOrder, LinkOrderField, SortDirection},
        link::Link,
    };
    use time::{Duration, macros::utc_datetime};

    fn link(id: i32, description: &str, url: &str, minutes: i64) -> Link {
        Link {
            id: Id::new(id),
            description: description.to_owned(),
            url: url.to_owned(),
            created_at: utc_datetime!(2025-01-01 00:00) + Duration::minutes(minutes),
            author_id: None,
        }
    }

    #[test]
    fn cache_id_without_arguments() {
        assert_eq!(FeedArgs::default().cache_id().unwrap(), "main-feed:{}");
    }

    #[test]
    fn cache_id_serializes_arguments_in_order() {
        let args = FeedArgs {
            filter: Some("rust".to_owned()),
            skip: Some(1),
            take: Some(2),
            order_by: Some(vec![
                LinkOrder::new(LinkOrderField::CreatedAt, SortDirection::Desc),
                LinkOrder::new(LinkOrderField::Url, SortDirection::Asc),
            ]),
        };

        assert_eq!(
            args.cache_id().unwrap(),
            r#"main-feed:{"filter":"rust","skip":1,"take":2,"orderBy":[{"createdAt":"desc"},{"url":"asc"}]}"#
        );
    }

    #[test]
    fn cache_id_is_stable_and_sensitive_to_skip() {
        let args = FeedArgs {
            filter: Some("graphql".to_owned()),
            take: Some(10),
            ..FeedArgs::default()
        };

        assert_eq!(args.cache_id().unwrap(), args.clone().cache_id().unwrap());

        let skipped = FeedArgs {
            skip: Some(10),
            ..args.clone()
        };
        assert_ne!(args.cache_id().unwrap(), skipped.cache_id().unwrap());
    }

    #[test]
    fn query_defaults() {
        let query = FeedArgs::default().to_query().unwrap();

        assert_eq!(query.filter, None);
        assert_eq!(query.skip, 0);
        assert_eq!(query.take, None);
        assert!(query.order_by.is_empty());
    }

    #[test]
    fn query_rejects_negative_bounds() {
        let negative_skip = FeedArgs {
            skip: Some(-1),
            ..FeedArgs::default()
        };
        assert_eq!(negative_skip.to_query(), Err(FeedArgsError::NegativeSkip(-1)));

        let negative_take = FeedArgs {
            take: Some(-3),
            ..FeedArgs::default()
        };
        assert_eq!(negative_take.to_query(), Err(FeedArgsError::NegativeTake(-3)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let args = FeedArgs {
            filter: Some(String::new()),
            ..FeedArgs::default()
        };
        assert_eq!(args.to_query().unwrap().filter, None);
    }

    #[test]
    fn filter_matches_description_or_url() {
        let filter = LinkFilter::new("rust".to_owned()).unwrap();

        assert!(filter.matches(&link(1, "learning rust", "https://a.example", 0)));
        assert!(filter.matches(&link(2, "a book", "https://rust-lang.org", 0)));
        assert!(!filter.matches(&link(3, "Rust, capitalised", "https://b.example", 0)));
    }

    #[test]
    fn order_from_fields() {
        assert_eq!(
            LinkOrder::from_fields(None, Some(SortDirection::Desc), None),
            Ok(LinkOrder::new(LinkOrderField::Url, SortDirection::Desc))
        );
        assert_eq!(
            LinkOrder::from_fields(None, None, None),
            Err(FeedArgsError::EmptyOrderDirective)
        );
        assert_eq!(
            LinkOrder::from_fields(
                Some(SortDirection::Asc),
                None,
                Some(SortDirection::Desc)
            ),
            Err(FeedArgsError::CompositeOrderDirective(2))
        );
    }

    #[test]
    fn composite_ordering_breaks_ties_in_sequence() {
        let mut links = vec![
            link(1, "b", "https://x", 3),
            link(2, "a", "https://y", 1),
            link(3, "b", "https://z", 2),
            link(4, "a", "https://y", 1),
        ];
        let query = FeedArgs {
            order_by: Some(vec![
                LinkOrder::new(LinkOrderField::Description, SortDirection::Asc),
                LinkOrder::new(LinkOrderField::CreatedAt, SortDirection::Desc),
            ]),
            ..FeedArgs::default()
        }
        .to_query()
        .unwrap();

        links.sort_by(|a, b| query.compare(a, b));
        let ids: Vec<i32> = links.iter().map(|link| link.id.get()).collect();

        assert_eq!(ids, [2, 4, 1, 3]);
    }
}
