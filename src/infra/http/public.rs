use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Deserializer, Serialize};
use time::{OffsetDateTime, UtcOffset, macros::format_description};

use crate::{
    application::{
        error::HttpError,
        replies::{FeedType, ReplyFeed, ReplyFeedRequest, ReplyFeedService},
        syndication::SyndicationRenderer,
    },
    domain::entities::ReplyItem,
    infra::db::PostgresRepositories,
};

use super::{
    db_health_response,
    middleware::{FeedContext, log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub replies: Arc<ReplyFeedService>,
    pub syndication: Arc<SyndicationRenderer>,
    pub db: Option<Arc<PostgresRepositories>>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/show-replies", get(show_replies))
        .route("/people/{nick}/replies", get(person_replies))
        .route("/_health/db", get(public_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShowRepliesQuery {
    nick: Option<String>,
    #[serde(deserialize_with = "lenient_offset")]
    offset: Option<i64>,
    output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedParams {
    #[serde(deserialize_with = "lenient_offset")]
    offset: Option<i64>,
    output: Option<String>,
}

/// Offsets are sanitized downstream, so a blank or malformed value reads as
/// absent instead of rejecting the request.
fn lenient_offset<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// JSON body of a page view.
#[derive(Serialize)]
struct ReplyPageView<'a> {
    nick: &'a str,
    offset: u64,
    first_page: bool,
    item_limit: u32,
    items: &'a [ReplyItem],
}

async fn show_replies(
    State(state): State<HttpState>,
    Query(query): Query<ShowRepliesQuery>,
) -> Response {
    let Some(nick) = query.nick.as_deref() else {
        return HttpError::new(
            "infra::http::public::show_replies",
            StatusCode::BAD_REQUEST,
            "Missing nick",
            "`nick` query parameter is required",
        )
        .into_response();
    };

    reply_feed_response(
        &state,
        ReplyFeedRequest {
            nick,
            offset: query.offset,
            output: query.output.as_deref(),
        },
    )
    .await
}

async fn person_replies(
    State(state): State<HttpState>,
    Path(nick): Path<String>,
    Query(params): Query<FeedParams>,
) -> Response {
    reply_feed_response(
        &state,
        ReplyFeedRequest {
            nick: &nick,
            offset: params.offset,
            output: params.output.as_deref(),
        },
    )
    .await
}

async fn reply_feed_response(state: &HttpState, request: ReplyFeedRequest<'_>) -> Response {
    let context = FeedContext {
        nick: request.nick.to_string(),
        feed_type: request.output.map(FeedType::from_output),
    };

    let feed = match state.replies.get_reply_feed(&request).await {
        Ok(feed) => feed,
        Err(err) => {
            let mut response = HttpError::from(err).into_response();
            context.attach(&mut response);
            return response;
        }
    };

    let mut response = match (feed.feed_type, state.syndication.render(&feed)) {
        (Some(feed_type), Some(document)) => xml_response(document, feed_type.content_type()),
        _ => Json(ReplyPageView {
            nick: &feed.nick,
            offset: feed.query.offset,
            first_page: feed.query.first_page,
            item_limit: feed.query.item_limit,
            items: &feed.items,
        })
        .into_response(),
    };

    apply_freshness_headers(&mut response, &feed);
    context.attach(&mut response);
    response
}

fn apply_freshness_headers(response: &mut Response, feed: &ReplyFeed) {
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&format!(
        "public, max-age={}",
        feed.freshness_seconds
    )) {
        headers.insert(CACHE_CONTROL, value);
    }
    if let Some(value) = http_date(feed.expires_at).and_then(|date| HeaderValue::from_str(&date).ok())
    {
        headers.insert(EXPIRES, value);
    }
}

/// IMF-fixdate, e.g. `Fri, 01 Mar 2024 12:01:30 GMT`.
fn http_date(value: OffsetDateTime) -> Option<String> {
    value
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))
        .ok()
}

async fn public_health(State(state): State<HttpState>) -> Response {
    let result = match state.db.as_ref() {
        Some(db) => Some(db.health_check().await),
        None => None,
    };
    db_health_response(result)
}

fn xml_response(body: String, content_type: &str) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, format!("{content_type}; charset=utf-8"))
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn show_replies_query(uri: &str) -> ShowRepliesQuery {
        let uri: axum::http::Uri = uri.parse().expect("uri");
        Query::<ShowRepliesQuery>::try_from_uri(&uri)
            .expect("query never rejects offsets")
            .0
    }

    #[test]
    fn blank_offsets_read_as_absent() {
        for uri in [
            "/show-replies?nick=alice&offset=",
            "/show-replies?nick=alice&offset=%20",
            "/show-replies?nick=alice&offset=ten",
            "/show-replies?nick=alice",
        ] {
            assert_eq!(show_replies_query(uri).offset, None, "{uri}");
        }
    }

    #[test]
    fn numeric_offsets_are_parsed() {
        assert_eq!(
            show_replies_query("/show-replies?nick=alice&offset=40").offset,
            Some(40)
        );
        assert_eq!(
            show_replies_query("/show-replies?nick=alice&offset=-5").offset,
            Some(-5)
        );
    }

    #[test]
    fn http_dates_use_imf_fixdate() {
        assert_eq!(
            http_date(datetime!(2024-03-01 12:01:30 UTC)).as_deref(),
            Some("Fri, 01 Mar 2024 12:01:30 GMT")
        );
    }

    #[test]
    fn http_dates_are_converted_to_gmt() {
        assert_eq!(
            http_date(datetime!(2024-03-01 14:01:30 +2)).as_deref(),
            Some("Fri, 01 Mar 2024 12:01:30 GMT")
        );
    }
}
