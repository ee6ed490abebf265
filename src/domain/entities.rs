//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::sections::section_link;

/// A user resolved from a validated nick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: i32,
    pub nick: String,
}

/// Raw reply event as returned by the event store, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEventRecord {
    pub comment_id: i32,
    pub comment_author_id: i32,
    pub comment_date: OffsetDateTime,
    pub topic_title: Option<String>,
    pub section_title: String,
    pub group_title: String,
    pub group_url_segment: String,
    pub section_id: i32,
    pub topic_id: i32,
    pub last_modified: Option<OffsetDateTime>,
    pub message: String,
    /// Whether `message` is stored as markup and must pass through the renderer.
    pub markup: bool,
}

/// Rendered message body paired with its author's display name.
///
/// The two values only ever travel together, so an item either carries both
/// or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyContent {
    pub message_text: String,
    pub author_nick: String,
}

/// One entry of a reply feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyItem {
    pub comment_id: i32,
    pub comment_author_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub comment_date: OffsetDateTime,
    #[serde(flatten)]
    pub content: Option<ReplyContent>,
    pub subject: String,
    pub group_title: String,
    pub group_url_segment: String,
    pub section_title: String,
    pub section_id: i32,
    pub topic_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
}

impl ReplyItem {
    /// Map a raw event onto a feed item.
    ///
    /// A missing last-modified stamp becomes the Unix epoch so consumers can
    /// always compare it.
    pub fn from_record(
        record: ReplyEventRecord,
        subject: String,
        content: Option<ReplyContent>,
    ) -> Self {
        Self {
            comment_id: record.comment_id,
            comment_author_id: record.comment_author_id,
            comment_date: record.comment_date,
            content,
            subject,
            group_title: record.group_title,
            group_url_segment: record.group_url_segment,
            section_title: record.section_title,
            section_id: record.section_id,
            topic_id: record.topic_id,
            last_modified: record.last_modified.unwrap_or(OffsetDateTime::UNIX_EPOCH),
        }
    }

    pub fn message_text(&self) -> Option<&str> {
        self.content
            .as_ref()
            .map(|content| content.message_text.as_str())
    }

    pub fn author_nick(&self) -> Option<&str> {
        self.content
            .as_ref()
            .map(|content| content.author_nick.as_str())
    }

    pub fn section_url(&self) -> String {
        section_link(self.section_id)
    }

    pub fn group_url(&self) -> String {
        format!("{}{}/", section_link(self.section_id), self.group_url_segment)
    }

    pub fn topic_url(&self) -> String {
        format!("{}{}", self.group_url(), self.topic_id)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn record() -> ReplyEventRecord {
        ReplyEventRecord {
            comment_id: 501,
            comment_author_id: 7,
            comment_date: datetime!(2024-03-01 12:00 UTC),
            topic_title: Some("Kernel 6.8 released".to_string()),
            section_title: "News".to_string(),
            group_title: "Linux General".to_string(),
            group_url_segment: "general".to_string(),
            section_id: 1,
            topic_id: 42,
            last_modified: None,
            message: "text".to_string(),
            markup: false,
        }
    }

    #[test]
    fn missing_last_modified_becomes_epoch() {
        let item = ReplyItem::from_record(record(), "Kernel".to_string(), None);
        assert_eq!(item.last_modified, OffsetDateTime::UNIX_EPOCH);
        assert_ne!(item.last_modified, item.comment_date);
    }

    #[test]
    fn present_last_modified_is_kept() {
        let mut source = record();
        source.last_modified = Some(datetime!(2024-03-02 08:30 UTC));
        let item = ReplyItem::from_record(source, "Kernel".to_string(), None);
        assert_eq!(item.last_modified, datetime!(2024-03-02 08:30 UTC));
    }

    #[test]
    fn urls_follow_section_and_group() {
        let item = ReplyItem::from_record(record(), "Kernel".to_string(), None);
        assert_eq!(item.section_url(), "/news/");
        assert_eq!(item.group_url(), "/news/general/");
        assert_eq!(item.topic_url(), "/news/general/42");
    }

    #[test]
    fn serialized_item_omits_absent_content() {
        let item = ReplyItem::from_record(record(), "Kernel".to_string(), None);
        let json = serde_json::to_value(&item).expect("serialize item");
        assert!(json.get("message_text").is_none());
        assert!(json.get("author_nick").is_none());
        assert_eq!(json["subject"], "Kernel");
    }

    #[test]
    fn page_view_list_round_trips_without_content() {
        let items: std::sync::Arc<Vec<ReplyItem>> = std::sync::Arc::new(vec![
            ReplyItem::from_record(record(), "Kernel".to_string(), None),
            ReplyItem::from_record(record(), "(no title)".to_string(), None),
        ]);
        let json = serde_json::to_string(&items).expect("serialize list");
        let back: std::sync::Arc<Vec<ReplyItem>> =
            serde_json::from_str(&json).expect("deserialize list");

        assert_eq!(back, items);
        assert!(back.iter().all(|item| item.content.is_none()));
        assert!(back.iter().all(|item| item.author_nick().is_none()));
    }

    #[test]
    fn serialized_item_flattens_content() {
        let content = ReplyContent {
            message_text: "<p>hi</p>".to_string(),
            author_nick: "bob".to_string(),
        };
        let item = ReplyItem::from_record(record(), "Kernel".to_string(), Some(content));
        let json = serde_json::to_string(&item).expect("serialize item");
        let back: ReplyItem = serde_json::from_str(&json).expect("deserialize item");
        assert_eq!(back.message_text(), Some("<p>hi</p>"));
        assert_eq!(back.author_nick(), Some("bob"));
    }
}
