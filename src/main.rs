use std::{process, sync::Arc};

use brezza::{
    application::{content::ContentService, error::AppError},
    cache::TagCache,
    config,
    infra::{cms::CmsClient, error::InfraError, http, telemetry},
};
use clap::Parser;
use tracing::{Dispatch, Level, dispatcher, error, info};
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
    let cli = config::CliArgs::parse();
    let settings = config::load(&cli)?;

    telemetry::init(&settings.logging)?;

    if settings.revalidate.secret.is_none() {
        info!(
            target = "brezza::server",
            "no revalidation secret configured; webhook requests will be rejected"
        );
    }

    let cache = Arc::new(TagCache::new(settings.cms.cache_capacity));
    let cms = CmsClient::new(settings.cms.base_url.clone(), cache)?;
    let content = Arc::new(ContentService::new(cms, settings.cms.slug_scan_limit));

    let state = http::AppState {
        content,
        revalidate_secret: settings.revalidate.secret.clone(),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "brezza::server",
        addr = %settings.server.addr,
        cms = %settings.cms.base_url,
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
