use async_trait::async_trait;

use crate::{
    application::repos::{RepoError, UsersRepo},
    cache::lock::mutex_lock,
    domain::entities::UserRef,
};

use super::{PostgresRepositories, map_sqlx_error};

const SOURCE: &str = "infra::db::users";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i32,
    nick: String,
}

impl From<UserRow> for UserRef {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            nick: row.nick,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn find_by_nick(&self, nick: &str) -> Result<Option<UserRef>, RepoError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, nick FROM users WHERE nick = $1")
            .bind(nick)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRef::from))
    }

    /// Author nicks repeat heavily within a feed, so resolved ids are kept in
    /// a small LRU. Nicks never change once assigned.
    async fn find_nick_by_id(&self, user_id: i32) -> Result<Option<String>, RepoError> {
        let cached = mutex_lock(&self.nick_cache, SOURCE, "nick_cache_get")
            .get(&user_id)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let nick: Option<String> = sqlx::query_scalar("SELECT nick FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if let Some(nick) = nick.as_ref() {
            mutex_lock(&self.nick_cache, SOURCE, "nick_cache_put").put(user_id, nick.clone());
        }
        Ok(nick)
    }

    async fn list_ignored(&self, user_id: i32) -> Result<Vec<i32>, RepoError> {
        sqlx::query_scalar("SELECT ignored FROM ignore_list WHERE userid = $1")
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
