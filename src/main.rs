use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use carousel::{
    application::{carousel::CarouselService, error::AppError, repos::GalaxiesRepo},
    cache::{CacheConfig, TtlCache},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::{net::TcpListener, sync::Notify};
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
        config::Command::CheckDb(_) => run_check_db(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = connect_repositories(&settings).await?;
    let cache_config = CacheConfig::from(&settings.cache);

    let galaxies_repo: Arc<dyn GalaxiesRepo> = repositories.clone();
    let carousel = Arc::new(CarouselService::new(
        galaxies_repo,
        Arc::new(TtlCache::new()),
        cache_config.clone(),
    ));

    let state = HttpState {
        carousel,
        db: repositories,
        asset_base_url: Arc::from(settings.carousel.asset_base_url.as_str()),
    };

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target: "carousel::serve",
        addr = %settings.server.addr,
        cache_key = %cache_config.key,
        cache_ttl_secs = cache_config.ttl_secs(),
        "Serving carousel"
    );

    serve_http(listener, http::build_router(state), settings.server.graceful_shutdown).await
}

async fn run_check_db(settings: config::Settings) -> Result<(), AppError> {
    let repositories = connect_repositories(&settings).await?;

    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target: "carousel::check_db", "Database reachable");
    Ok(())
}

async fn connect_repositories(
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
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(
    listener: TcpListener,
    router: axum::Router,
    grace: Duration,
) -> Result<(), AppError> {
    let shutdown_requested = Arc::new(Notify::new());
    let notifier = shutdown_requested.clone();

    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            notifier.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        _ = async {
            shutdown_requested.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(
                target: "carousel::serve",
                grace_secs = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target: "carousel::serve", "Shutdown requested; draining connections");
}
