//! RSS and Atom rendering for reply feeds.
//!
//! Documents are built straight from an assembled [`ReplyFeed`]; the HTTP
//! layer only picks the content type.

use time::{
    OffsetDateTime,
    format_description::well_known::{Rfc2822, Rfc3339},
};

use crate::application::replies::{FeedType, ReplyFeed};
use crate::domain::entities::ReplyItem;

#[derive(Debug, Clone)]
pub struct SyndicationRenderer {
    public_site_url: String,
}

impl SyndicationRenderer {
    pub fn new(public_site_url: &str) -> Self {
        Self {
            public_site_url: normalize_public_site_url(public_site_url),
        }
    }

    /// Render the document `feed` asked for, or `None` for a page view.
    pub fn render(&self, feed: &ReplyFeed) -> Option<String> {
        feed.feed_type.map(|feed_type| match feed_type {
            FeedType::Rss => self.rss(feed),
            FeedType::Atom => self.atom(feed),
        })
    }

    /// RSS 2.0 document.
    pub fn rss(&self, feed: &ReplyFeed) -> String {
        let base = &self.public_site_url;
        let self_link = self.feed_link(feed, FeedType::Rss);

        let mut items = String::new();
        for item in feed.items.iter() {
            let link = self.item_link(item);
            let pub_date = format_date(item.comment_date, &Rfc2822);
            items.push_str(&format!(
                "    <item>\n      <title>{}</title>\n      <link>{}</link>\n      <guid isPermaLink=\"true\">{}</guid>\n      <pubDate>{}</pubDate>\n",
                xml_escape(&item.subject),
                xml_escape(&link),
                xml_escape(&link),
                pub_date,
            ));
            if let Some(author) = item.author_nick() {
                items.push_str(&format!(
                    "      <dc:creator>{}</dc:creator>\n",
                    xml_escape(author)
                ));
            }
            if let Some(message) = item.message_text() {
                items.push_str(&format!(
                    "      <description>{}</description>\n",
                    cdata(message)
                ));
            }
            items.push_str("    </item>\n");
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\" xmlns:dc=\"http://purl.org/dc/elements/1.1/\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n    <description>{}</description>\n{}  </channel>\n</rss>\n",
            xml_escape(&feed_title(feed)),
            xml_escape(base),
            xml_escape(&self_link),
            xml_escape(&feed_title(feed)),
            items
        )
    }

    /// Atom 1.0 document.
    pub fn atom(&self, feed: &ReplyFeed) -> String {
        let self_link = self.feed_link(feed, FeedType::Atom);
        let updated = feed
            .items
            .iter()
            .map(|item| item.comment_date)
            .max()
            .unwrap_or_else(OffsetDateTime::now_utc);

        let mut entries = String::new();
        for item in feed.items.iter() {
            let link = self.item_link(item);
            entries.push_str(&format!(
                "  <entry>\n    <title>{}</title>\n    <link href=\"{}\"/>\n    <id>{}</id>\n    <updated>{}</updated>\n",
                xml_escape(&item.subject),
                xml_escape(&link),
                xml_escape(&link),
                format_date(item.comment_date, &Rfc3339),
            ));
            if let Some(author) = item.author_nick() {
                entries.push_str(&format!(
                    "    <author><name>{}</name></author>\n",
                    xml_escape(author)
                ));
            }
            if let Some(message) = item.message_text() {
                entries.push_str(&format!(
                    "    <content type=\"html\">{}</content>\n",
                    cdata(message)
                ));
            }
            entries.push_str("  </entry>\n");
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n  <title>{}</title>\n  <id>{}</id>\n  <updated>{}</updated>\n  <link href=\"{}\" rel=\"self\"/>\n{}</feed>\n",
            xml_escape(&feed_title(feed)),
            xml_escape(&self_link),
            format_date(updated, &Rfc3339),
            xml_escape(&self_link),
            entries
        )
    }

    /// Absolute link to one reply inside its topic.
    pub fn item_link(&self, item: &ReplyItem) -> String {
        let topic = item.topic_url();
        format!(
            "{}{}?cid={}",
            self.public_site_url,
            topic.trim_start_matches('/'),
            item.comment_id
        )
    }

    fn feed_link(&self, feed: &ReplyFeed, feed_type: FeedType) -> String {
        let nick: String = url::form_urlencoded::byte_serialize(feed.nick.as_bytes()).collect();
        format!(
            "{}show-replies?nick={nick}&output={}",
            self.public_site_url,
            feed_type.as_str()
        )
    }
}

fn feed_title(feed: &ReplyFeed) -> String {
    format!("Replies to {}", feed.nick)
}

fn format_date<F>(value: OffsetDateTime, format: &F) -> String
where
    F: time::formatting::Formattable + ?Sized,
{
    value.format(format).unwrap_or_else(|_| value.to_string())
}

fn normalize_public_site_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    format!("{trimmed}/")
}

/// Wrap `input` in CDATA, splitting any embedded terminator.
fn cdata(input: &str) -> String {
    format!("<![CDATA[{}]]>", input.replace("]]>", "]]]]><![CDATA[>"))
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::application::replies::FeedQuery;
    use crate::domain::entities::ReplyContent;

    fn item(comment_id: i32, content: Option<ReplyContent>) -> ReplyItem {
        ReplyItem {
            comment_id,
            comment_author_id: 7,
            comment_date: datetime!(2024-03-01 12:00 UTC),
            content,
            subject: "Tips & <tricks>".to_string(),
            group_title: "General".to_string(),
            group_url_segment: "general".to_string(),
            section_title: "Forum".to_string(),
            section_id: 2,
            topic_id: 10,
            last_modified: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn feed(feed_type: Option<FeedType>, items: Vec<ReplyItem>) -> ReplyFeed {
        ReplyFeed {
            nick: "alice".to_string(),
            query: FeedQuery::normalize(Some(0), feed_type.is_some(), 20),
            items: Arc::new(items),
            freshness_seconds: 90,
            expires_at: datetime!(2024-03-01 12:01:30 UTC),
            feed_type,
        }
    }

    fn content() -> ReplyContent {
        ReplyContent {
            message_text: "<p>see ]]> here</p>".to_string(),
            author_nick: "carol".to_string(),
        }
    }

    fn renderer() -> SyndicationRenderer {
        SyndicationRenderer::new("https://example.org")
    }

    #[test]
    fn page_view_renders_nothing() {
        assert!(renderer().render(&feed(None, vec![item(1, None)])).is_none());
    }

    #[test]
    fn item_links_point_at_the_comment() {
        let link = renderer().item_link(&item(501, None));
        assert_eq!(link, "https://example.org/forum/general/10?cid=501");
    }

    #[test]
    fn rss_document_contains_escaped_items() {
        let xml = renderer()
            .render(&feed(Some(FeedType::Rss), vec![item(1, Some(content()))]))
            .expect("rss");

        assert!(xml.contains("<rss version=\"2.0\""));
        assert!(xml.contains("<title>Replies to alice</title>"));
        assert!(xml.contains("<title>Tips &amp; &lt;tricks&gt;</title>"));
        assert!(xml.contains("<pubDate>Fri, 01 Mar 2024 12:00:00 +0000</pubDate>"));
        assert!(xml.contains("<dc:creator>carol</dc:creator>"));
        assert!(xml.contains("<![CDATA[<p>see ]]]]><![CDATA[> here</p>]]>"), "{xml}");
    }

    #[test]
    fn atom_document_uses_rfc3339_and_author() {
        let xml = renderer()
            .render(&feed(Some(FeedType::Atom), vec![item(1, Some(content()))]))
            .expect("atom");

        assert!(xml.contains("<feed xmlns=\"http://www.w3.org/2005/Atom\">"));
        assert!(xml.contains("<updated>2024-03-01T12:00:00Z</updated>"));
        assert!(xml.contains("<author><name>carol</name></author>"));
        assert!(xml.contains("<content type=\"html\">"));
        assert!(xml.contains("show-replies?nick=alice&amp;output=atom"));
    }

    #[test]
    fn items_without_content_omit_body_and_author() {
        let xml = renderer().rss(&feed(Some(FeedType::Rss), vec![item(1, None)]));
        assert!(!xml.contains("<description><![CDATA["));
        assert!(!xml.contains("dc:creator>"));
    }
}
