use std::{
    error::Error,
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use cardwise_rs::{
    AppState, Catalog, FileStore, build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for cardwise_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory that generated user data and reports are saved under.
    #[arg(long, env = "DATA_DIR", default_value = "test_data")]
    data_dir: PathBuf,

    /// File path to a JSON catalog of merchants, category weights and cards.
    ///
    /// The built-in catalog is used if this is not set.
    #[arg(long, env = "CATALOG_PATH")]
    catalog_path: Option<PathBuf>,

    /// The address to serve the API from.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The canonical timezone used to decide today's date, e.g. "Pacific/Auckland".
    #[arg(long, env = "TIMEZONE", default_value = "Etc/UTC")]
    timezone: String,

    /// How many days back generated transactions may be dated by default.
    #[arg(long, env = "LOOKBACK_DAYS", default_value_t = 365)]
    lookback_days: u32,

    /// The largest number of transactions a single request may generate.
    #[arg(long, env = "MAX_TRANSACTIONS", default_value_t = 100_000)]
    max_transactions: i64,

    /// The largest lookback window a single request may ask for, in days.
    #[arg(long, env = "MAX_LOOKBACK_DAYS", default_value_t = 36_500)]
    max_lookback_days: u32,

    /// Seed the random number generator so generated data is repeatable.
    #[arg(long, env = "SEED")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    let addr = SocketAddr::from((args.host, args.port));

    let catalog = match &args.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::default(),
    };

    let app_state = AppState::new(catalog, FileStore::new(&args.data_dir), &args.timezone)?
        .with_lookback_days(args.lookback_days)
        .with_max_transactions(args.max_transactions)
        .with_max_lookback_days(args.max_lookback_days)
        .with_seed(args.seed);

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(app_state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!(
        "HTTP server listening on {addr}, saving data to {}",
        args.data_dir.display()
    );
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged when they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}
