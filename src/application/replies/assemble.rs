use std::sync::Arc;

use crate::application::render::ContentRenderer;
use crate::application::repos::UsersRepo;
use crate::domain::entities::{ReplyContent, ReplyEventRecord, ReplyItem};

use super::ReplyFeedError;

/// Turns raw reply events into feed items.
///
/// Message bodies and author nicks are only resolved for full-content
/// requests; page views skip the renderer and the user lookup entirely.
#[derive(Clone)]
pub struct ReplyAssembler {
    users: Arc<dyn UsersRepo>,
    renderer: Arc<dyn ContentRenderer>,
}

impl ReplyAssembler {
    pub fn new(users: Arc<dyn UsersRepo>, renderer: Arc<dyn ContentRenderer>) -> Self {
        Self { users, renderer }
    }

    pub async fn assemble(
        &self,
        records: Vec<ReplyEventRecord>,
        full_content: bool,
    ) -> Result<Vec<ReplyItem>, ReplyFeedError> {
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            let subject = self.renderer.normalize_title(record.topic_title.as_deref());
            let content = if full_content {
                Some(self.resolve_content(&record).await?)
            } else {
                None
            };
            items.push(ReplyItem::from_record(record, subject, content));
        }
        Ok(items)
    }

    async fn resolve_content(
        &self,
        record: &ReplyEventRecord,
    ) -> Result<ReplyContent, ReplyFeedError> {
        let message_text = if record.markup {
            self.renderer.render_markup(&record.message)?
        } else {
            record.message.clone()
        };

        let author_nick = self
            .users
            .find_nick_by_id(record.comment_author_id)
            .await?
            .ok_or(ReplyFeedError::AuthorNotFound(record.comment_author_id))?;

        Ok(ReplyContent {
            message_text,
            author_nick,
        })
    }
}
