/*!
popdash REST API Server

Serves the population dashboard: an HTML page per view and the same views as
JSON for other frontends.

## Usage

```bash
popdash-rest --database duckdb://wpp.db --geojson borders.geojson
popdash-rest --load-sample-data
```

## Endpoints

- `GET /?query=..&view=..` - Dashboard page
- `GET /api/v1/view?query=..&view=..` - Table and Vega-Lite spec as JSON
- `GET /api/v1/health` - Health check
- `GET /api/v1/version` - Version information
*/

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use popdash::reader::DuckDBStore;
use popdash::transform::map::DEFAULT_REFERENCE_YEAR;
use popdash::writer::html::{render_page, NavLink};
use popdash::{
    dispatch, schema, GeoSource, MapPolicy, PopdashError, ViewContext, ViewResponse, VERSION,
};

/// CLI arguments for the REST API server
#[derive(Parser)]
#[command(name = "popdash-rest")]
#[command(about = "popdash REST API Server")]
#[command(version = VERSION)]
struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind to
    #[arg(long, default_value = "3334")]
    port: u16,

    /// CORS allowed origins (comma-separated)
    #[arg(long, default_value = "*")]
    cors_origin: String,

    /// Population database (duckdb://memory or duckdb://path/to/file.db)
    #[arg(long, default_value = "duckdb://memory")]
    database: String,

    /// GeoJSON FeatureCollection of country borders (NAME_ENGL property)
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Year shown by the density map
    #[arg(long, default_value_t = DEFAULT_REFERENCE_YEAR)]
    reference_year: i32,

    /// Countries left out of the density map; replaces the default list
    /// Example: --exclude Monaco --exclude Malta
    #[arg(long = "exclude")]
    excluded: Vec<String>,

    /// Load the demo dataset into an in-memory database
    #[arg(long, default_value = "false")]
    load_sample_data: bool,

    /// Load table files into an in-memory database
    /// Supports: CSV, Parquet, JSON; the file name selects the table
    /// Example: --load-data country.csv --load-data fact_population.parquet
    #[arg(long = "load-data")]
    load_data_files: Vec<String>,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<DuckDBStore>,
    geo: Arc<GeoSource>,
    policy: Arc<MapPolicy>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// URL parameters selecting a view
#[derive(Debug, Default, Deserialize)]
struct ViewParams {
    query: Option<String>,
    view: Option<String>,
}

/// Successful API response
#[derive(Debug, Serialize)]
struct ApiSuccess<T> {
    status: String,
    data: T,
}

/// Error API response
#[derive(Debug, Serialize)]
struct ApiError {
    status: String,
    error: ErrorDetails,
}

#[derive(Debug, Serialize)]
struct ErrorDetails {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Version response
#[derive(Debug, Serialize)]
struct VersionResponse {
    version: String,
    features: Vec<String>,
}

// ============================================================================
// Error Handling
// ============================================================================

/// Custom error type for API responses
struct ApiErrorResponse {
    status: StatusCode,
    error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let json = Json(self.error);
        (self.status, json).into_response()
    }
}

impl From<PopdashError> for ApiErrorResponse {
    fn from(err: PopdashError) -> Self {
        // Parameters never fail a request, so every error is on the server side
        let error_type = match &err {
            PopdashError::ReaderError(_) => "ReaderError",
            PopdashError::ValidationError(_) => "ValidationError",
            PopdashError::WriterError(_) => "WriterError",
            PopdashError::GeoError(_) => "GeoError",
            PopdashError::InternalError(_) => "InternalError",
        };
        tracing::error!("{}: {}", error_type, err);

        ApiErrorResponse {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError {
                status: "error".to_string(),
                error: ErrorDetails {
                    message: err.to_string(),
                    error_type: error_type.to_string(),
                },
            },
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Navigation of the dashboard page: (label, query, view)
static NAV: [(&str, &str, &str); 9] = [
    ("World", "world", "table"),
    ("World chart", "world", "graph"),
    ("Regions", "region", "table"),
    ("Regions chart", "region", "graph"),
    ("Top 10", "top10", "table"),
    ("Top 10 chart", "top10", "graph"),
    ("Europe", "europe", "table"),
    ("Europe density map", "europe", "dens_map"),
    ("About", "about", "table"),
];

fn nav_links() -> Vec<NavLink<'static>> {
    NAV.iter()
        .map(|&(label, query, view)| NavLink {
            label,
            href: format!("/?query={}&view={}", query, view),
        })
        .collect()
}

/// Run one dispatch off the async runtime; the store call blocks
async fn run_view(state: AppState, params: ViewParams) -> Result<ViewResponse, ApiErrorResponse> {
    info!(
        "View query={:?} view={:?}",
        params.query.as_deref(),
        params.view.as_deref()
    );

    let response = tokio::task::spawn_blocking(move || {
        let ctx = ViewContext::new(state.store.as_ref(), state.geo.as_ref(), state.policy.as_ref());
        dispatch(&ctx, params.query.as_deref(), params.view.as_deref())
    })
    .await
    .map_err(|e| PopdashError::InternalError(format!("View task failed: {}", e)))??;

    Ok(response)
}

/// Build the shared store, loading schema and data when requested
fn open_store(cli: &Cli) -> Result<DuckDBStore, PopdashError> {
    info!("Opening store {}", cli.database);
    let store = DuckDBStore::from_connection_string(&cli.database)?;

    let wants_data = cli.load_sample_data || !cli.load_data_files.is_empty();
    if wants_data && cli.database != "duckdb://memory" {
        return Err(PopdashError::ValidationError(
            "--load-sample-data and --load-data need duckdb://memory; use `popdash init` for files"
                .to_string(),
        ));
    }

    if cli.database == "duckdb://memory" {
        store.with_connection(|conn| {
            schema::create_schema(conn)?;

            if cli.load_sample_data {
                info!("Loading sample data");
                schema::load_sample_data(conn)?;
            }

            if !cli.load_data_files.is_empty() {
                info!("Loading {} data file(s)", cli.load_data_files.len());
                schema::load_table_files(conn, &cli.load_data_files)?;
            }

            Ok(())
        })?;
        if !wants_data {
            info!("Starting with an empty in-memory database (no data pre-loaded)");
        }
    }

    Ok(store)
}

fn map_policy(cli: &Cli) -> MapPolicy {
    let mut policy = MapPolicy {
        reference_year: cli.reference_year,
        ..MapPolicy::default()
    };
    if !cli.excluded.is_empty() {
        policy.excluded = cli.excluded.clone();
    }
    policy
}

// ============================================================================
// Handler Functions
// ============================================================================

/// GET / - Dashboard page
async fn page_handler(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Html<String>, ApiErrorResponse> {
    let response = run_view(state, params).await?;
    Ok(Html(render_page(
        &response.title,
        &nav_links(),
        &response.table,
        response.plot_html.as_deref(),
    )))
}

/// GET /api/v1/view - Table and chart as JSON
async fn view_handler(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Json<ApiSuccess<ViewResponse>>, ApiErrorResponse> {
    let response = run_view(state, params).await?;
    Ok(Json(ApiSuccess {
        status: "success".to_string(),
        data: response,
    }))
}

/// GET /api/v1/health - Health check
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: VERSION.to_string(),
    })
}

/// GET /api/v1/version - Version information
async fn version_handler() -> Json<VersionResponse> {
    let mut features = Vec::new();

    #[cfg(feature = "duckdb")]
    features.push("duckdb".to_string());

    features.push("vegalite".to_string());

    Json(VersionResponse {
        version: VERSION.to_string(),
        features,
    })
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "popdash_rest=info,popdash=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let store = open_store(&cli)?;

    let geo = match &cli.geojson {
        Some(path) => GeoSource::load(path),
        None => {
            info!("No --geojson given; density maps will be empty");
            GeoSource::empty()
        }
    };

    let policy = map_policy(&cli);
    info!(
        "Density map year {}, {} excluded countries",
        policy.reference_year,
        policy.excluded.len()
    );

    // Create application state
    let state = AppState {
        store: Arc::new(store),
        geo: Arc::new(geo),
        policy: Arc::new(policy),
    };

    // Configure CORS
    let cors = if cli.cors_origin == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    } else {
        let origins: Vec<_> = cli
            .cors_origin
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(vec![header::CONTENT_TYPE])
    };

    // Build router
    let app = Router::new()
        .route("/", get(page_handler))
        .route("/api/v1/view", get(view_handler))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/version", get(version_handler))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;

    info!("Starting popdash REST API server on {}", addr);
    info!("API documentation:");
    info!("  GET  /                 - Dashboard page");
    info!("  GET  /api/v1/view      - View as JSON");
    info!("  GET  /api/v1/health    - Health check");
    info!("  GET  /api/v1/version   - Version info");

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
