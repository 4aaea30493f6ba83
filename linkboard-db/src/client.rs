use crate::record::{AuthenticationRecord, LinkRecord, UserRecord};
use crate::store::{DbError, LinkStore, Result};
use async_trait::async_trait;
use linkboard_common::model::{
    Id,
    auth::{AuthTokenHash, Authentication},
    feed::{LinkFilter, LinkOrderField, LinkQuery, SortDirection},
    link::{CreateLink, Link, LinkMarker},
    user::User,
};
use sqlx::{PgPool, Postgres, QueryBuilder, query_as};
use tracing::debug;

/// [`LinkStore`] backed by PostgreSQL.
#[derive(Clone, Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations that have not run yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const LINK_COLUMNS: &str =
    "links.link_id, links.description, links.url, links.created_at, links.user_id";

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: Option<&LinkFilter>) {
    if let Some(filter) = filter {
        builder
            .push(" WHERE strpos(links.description, ")
            .push_bind(filter.get().to_owned())
            .push(") > 0 OR strpos(links.url, ")
            .push_bind(filter.get().to_owned())
            .push(") > 0");
    }
}

fn order_column(field: LinkOrderField) -> &'static str {
    match field {
        LinkOrderField::Description => "links.description",
        LinkOrderField::Url => "links.url",
        LinkOrderField::CreatedAt => "links.created_at",
    }
}

fn order_direction(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// Page of links for `query`: filtered, ordered by the directives and then by id.
fn feed_query(query: &LinkQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT {LINK_COLUMNS} FROM links"));
    push_filter(&mut builder, query.filter.as_ref());

    builder.push(" ORDER BY ");
    for order in &query.order_by {
        builder
            .push(order_column(order.field))
            .push(" ")
            .push(order_direction(order.direction))
            .push(", ");
    }
    builder.push("links.link_id ASC");

    builder.push(" OFFSET ").push_bind(i64::from(query.skip));
    if let Some(take) = query.take {
        builder.push(" LIMIT ").push_bind(i64::from(take));
    }

    builder
}

fn count_query(filter: Option<&LinkFilter>) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM links");
    push_filter(&mut builder, filter);

    builder
}

#[async_trait]
impl LinkStore for DbClient {
    async fn fetch_links(&self, query: &LinkQuery) -> Result<Vec<Link>> {
        let mut builder = feed_query(query);
        debug!(sql = builder.sql(), "Fetching links");

        let records = builder
            .build_query_as::<LinkRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Link::from).collect())
    }

    async fn count_links(&self, filter: Option<&LinkFilter>) -> Result<u64> {
        let count = count_query(filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count).map_err(|_| DbError::CountOutOfRange(count))
    }

    async fn fetch_link_author(&self, link_id: Id<LinkMarker>) -> Result<Option<User>> {
        let record = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.handle
            FROM
                links JOIN users ON users.user_id = links.user_id
            WHERE
                links.link_id = $1
            ",
        )
        .bind(link_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    async fn fetch_link_voters(&self, link_id: Id<LinkMarker>) -> Result<Vec<User>> {
        let records = query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.handle
            FROM
                votes JOIN users ON users.user_id = votes.user_id
            WHERE
                votes.link_id = $1
            ORDER BY
                users.user_id
            ",
        )
        .bind(link_id.get())
        .fetch_all(&self.pool)
        .await?;

        let users = records
            .into_iter()
            .map(User::try_from)
            .collect::<Result<_, _>>()?;
        Ok(users)
    }

    async fn create_link(&self, link: &CreateLink) -> Result<Link> {
        let record = query_as::<_, LinkRecord>(
            "
            INSERT INTO links (description, url, user_id)
            VALUES ($1, $2, $3)
            RETURNING
                link_id,
                description,
                url,
                created_at,
                user_id
            ",
        )
        .bind(&link.description)
        .bind(&link.url)
        .bind(link.author.get())
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DbError::UnknownUser(link.author)
            }
            err => DbError::Sqlx(err),
        })?;

        Ok(record.into())
    }

    async fn fetch_authentication(
        &self,
        token_hash: &AuthTokenHash,
    ) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                authentications.user_id,
                authentications.token_hash,
                authentications.created_at,
                authentications.expires_after_seconds
            FROM
                authentications
            WHERE
                authentications.token_hash = $1
            ",
        )
        .bind(token_hash.0.to_vec())
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }
}
