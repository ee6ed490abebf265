use std::{
    io::{self, Write},
    process,
    sync::Arc,
};

use replyfeed::{
    application::{
        error::AppError,
        render::{ContentRenderer, MarkdownRenderer},
        replies::{ReplyAssembler, ReplyFeedRequest, ReplyFeedService},
        repos::{ReplyEventsRepo, UsersRepo},
        syndication::SyndicationRenderer,
    },
    cache::{CacheConfig, CacheKeys},
    config,
    infra::{
        cache::build_reply_cache,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use serde_json::json;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Replies(args) => run_replies(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;
    let http_state = HttpState {
        replies: app.replies,
        syndication: app.syndication,
        db: Some(app.repositories),
    };
    serve_http(&settings, http_state).await
}

async fn run_replies(
    settings: config::Settings,
    args: config::RepliesArgs,
) -> Result<(), AppError> {
    let app = build_application_context(&settings).await?;

    let request = ReplyFeedRequest {
        nick: &args.nick,
        offset: args.offset,
        output: args.output.as_deref(),
    };
    let feed = app.replies.get_reply_feed(&request).await?;

    let body = match app.syndication.render(&feed) {
        Some(document) => document,
        None => {
            let page = json!({
                "nick": feed.nick,
                "offset": feed.query.offset,
                "first_page": feed.query.first_page,
                "item_limit": feed.query.item_limit,
                "freshness_seconds": feed.freshness_seconds,
                "items": feed.items,
            });
            serde_json::to_string_pretty(&page)
                .map_err(|err| AppError::unexpected(format!("failed to encode feed: {err}")))?
        }
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{body}").map_err(|err| AppError::from(InfraError::from(err)))?;
    Ok(())
}

struct ApplicationContext {
    repositories: Arc<PostgresRepositories>,
    replies: Arc<ReplyFeedService>,
    syndication: Arc<SyndicationRenderer>,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn build_application_context(
    settings: &config::Settings,
) -> Result<ApplicationContext, AppError> {
    let repositories = init_repositories(settings).await?;
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let events_repo: Arc<dyn ReplyEventsRepo> = repositories.clone();

    let renderer: Arc<dyn ContentRenderer> =
        Arc::new(MarkdownRenderer::new(settings.replies.max_message_bytes));

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = build_reply_cache(&cache_config).await?;

    let replies = Arc::new(ReplyFeedService::new(
        users_repo.clone(),
        events_repo,
        cache,
        ReplyAssembler::new(users_repo, renderer),
        CacheKeys::new(cache_config.namespace.clone()),
        settings.replies.default_page_size,
    ));
    let syndication = Arc::new(SyndicationRenderer::new(
        &settings.replies.public_site_url,
    ));

    Ok(ApplicationContext {
        repositories,
        replies,
        syndication,
    })
}

async fn serve_http(settings: &config::Settings, http_state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "Listening for HTTP requests");

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        () = shutdown_signal() => {
            let grace = settings.server.graceful_shutdown;
            info!(grace_seconds = grace.as_secs(), "Shutdown requested; draining connections");
            match tokio::time::timeout(grace, &mut server).await {
                Ok(result) => {
                    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?
                }
                Err(_) => warn!("Graceful shutdown window elapsed; closing remaining connections"),
            }
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
