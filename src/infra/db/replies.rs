use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{ReplyEventsQuery, ReplyEventsRepo, RepoError},
    domain::entities::ReplyEventRecord,
};

use super::{PostgresRepositories, map_sqlx_error, util::to_sql_bigint};

const REPLY_EVENTS_SQL: &str = r#"
    SELECT
        comments.id AS comment_id,
        comments.userid AS comment_author_id,
        comments.postdate::timestamptz AS comment_date,
        topics.title AS topic_title,
        sections.name AS section_title,
        groups.title AS group_title,
        groups.urlname AS group_url_segment,
        sections.id AS section_id,
        topics.id AS topic_id,
        topics.lastmod::timestamptz AS last_modified,
        msgbase.message AS message,
        msgbase.bbcode AS markup
    FROM sections
    INNER JOIN groups ON sections.id = groups.section
    INNER JOIN topics ON groups.id = topics.groupid
    INNER JOIN comments ON comments.topic = topics.id
    INNER JOIN user_events ON user_events.comment_id = comments.id
    INNER JOIN msgbase ON msgbase.id = comments.id
    WHERE user_events.userid = $1
      AND NOT comments.deleted
      AND NOT comments.topic_deleted
      AND comments.userid <> ALL($2)
    ORDER BY user_events.event_date DESC
    LIMIT $3 OFFSET $4
"#;

#[derive(sqlx::FromRow)]
struct ReplyEventRow {
    comment_id: i32,
    comment_author_id: i32,
    comment_date: OffsetDateTime,
    topic_title: Option<String>,
    section_title: String,
    group_title: String,
    group_url_segment: String,
    section_id: i32,
    topic_id: i32,
    last_modified: Option<OffsetDateTime>,
    message: String,
    markup: bool,
}

impl From<ReplyEventRow> for ReplyEventRecord {
    fn from(row: ReplyEventRow) -> Self {
        Self {
            comment_id: row.comment_id,
            comment_author_id: row.comment_author_id,
            comment_date: row.comment_date,
            topic_title: row.topic_title,
            section_title: row.section_title,
            group_title: row.group_title,
            group_url_segment: row.group_url_segment,
            section_id: row.section_id,
            topic_id: row.topic_id,
            last_modified: row.last_modified,
            message: row.message,
            markup: row.markup,
        }
    }
}

#[async_trait]
impl ReplyEventsRepo for PostgresRepositories {
    async fn list_reply_events(
        &self,
        query: ReplyEventsQuery<'_>,
    ) -> Result<Vec<ReplyEventRecord>, RepoError> {
        let limit = i64::from(query.limit);
        let offset = to_sql_bigint(query.offset, "offset")?;

        let rows = sqlx::query_as::<_, ReplyEventRow>(REPLY_EVENTS_SQL)
            .bind(query.user_id)
            .bind(query.excluded_authors)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReplyEventRecord::from).collect())
    }
}
