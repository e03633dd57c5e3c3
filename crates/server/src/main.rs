//! Leaderboard Server — multi-tenant ranked leaderboards over HTTP
//!
//! Usage:
//!   leaderboard-server serve --port 3001     — Launch the HTTP server
//!   leaderboard-server serve --lenient       — No-op on non-positive scores
//!
//! Configuration comes from the environment (dotenv-friendly):
//!   ADMIN_SECRET_TOKEN    — shared secret gating whole-board deletion
//!   LEADERBOARD_DB_PATH   — SQLite path for the property overlay

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use clap::{Parser, Subcommand};
use engine::{
    query::decorate_entries, BoardKey, EngineError, LeaderboardEngine, PropertyOverlay,
    RankedEntry, ScorePolicy, SqliteOverlay, UpdatePolicy, WindowQuery,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "leaderboard-server")]
#[command(about = "Multi-tenant ranked leaderboard service", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
        /// Silently no-op on non-positive scores instead of rejecting
        #[arg(long)]
        lenient: bool,
    },
}

#[derive(Clone)]
struct AppState {
    engine: Arc<LeaderboardEngine>,
    overlay: Arc<SqliteOverlay>,
    policy: ScorePolicy,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,leaderboard_server=debug")
    } else {
        EnvFilter::new("info,engine=info,leaderboard_server=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve {
            host,
            port,
            lenient,
        } => {
            let policy = if lenient {
                ScorePolicy::Lenient
            } else {
                ScorePolicy::Strict
            };
            cmd_serve(&host, port, policy).await?;
        }
    }

    Ok(())
}

async fn cmd_serve(host: &str, port: u16, policy: ScorePolicy) -> anyhow::Result<()> {
    info!("Leaderboard Server v{} starting...", APP_VERSION);

    let admin_token = std::env::var("ADMIN_SECRET_TOKEN").unwrap_or_default();
    if admin_token.is_empty() {
        info!("ADMIN_SECRET_TOKEN not set — leaderboard deletion is disabled");
    }

    let db_path =
        std::env::var("LEADERBOARD_DB_PATH").unwrap_or_else(|_| "data/leaderboard.db".to_string());
    let db = persistence::Database::new(&db_path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;
    info!("Database initialized: {}", db_path);

    let state = AppState {
        engine: Arc::new(LeaderboardEngine::new(admin_token)),
        overlay: Arc::new(SqliteOverlay::new(db.pool_clone())),
        policy,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(api_health))
        .route(
            "/:service/leaderboards/:board",
            get(api_board_status).delete(api_delete_board),
        )
        .route("/:service/leaderboards/:board/top", get(api_top_scores))
        .route(
            "/:service/leaderboards/:board/:member",
            get(api_member_rank)
                .put(api_put_score)
                .delete(api_remove_member),
        )
        .route(
            "/:service/leaderboards/:board/:member/around",
            get(api_around_scores),
        )
        .route("/:service/users/:member", put(api_put_properties))
        .with_state(state)
        .layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Leaderboard Server v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET    /health                                        - Health check");
    println!("  GET    /:service/leaderboards/:board                  - Cardinality");
    println!("  DELETE /:service/leaderboards/:board                  - Delete board (X-Auth)");
    println!("  GET    /:service/leaderboards/:board/top              - Top-K page");
    println!("  GET    /:service/leaderboards/:board/:member          - Member rank");
    println!("  PUT    /:service/leaderboards/:board/:member          - Submit score");
    println!("  DELETE /:service/leaderboards/:board/:member          - Remove member");
    println!("  GET    /:service/leaderboards/:board/:member/around   - Neighbor window");
    println!("  PUT    /:service/users/:member                        - Set properties");
    println!("\n  Score policy: {:?}", policy);
    println!("  Database: {}", db_path);
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error shaping
// ============================================================================

/// Boundary wrapper mapping the engine taxonomy to transport statuses.
/// Internal detail goes to the log, never to the client.
struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            EngineError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            EngineError::NotFound => (StatusCode::NOT_FOUND, "user not found".to_string()),
            EngineError::AccessDenied => {
                (StatusCode::FORBIDDEN, "Invalid authentication".to_string())
            }
            EngineError::Internal(detail) => {
                error!(detail = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn bad_body(rejection: JsonRejection) -> ApiError {
    ApiError(EngineError::invalid(format!(
        "request body invalid: {rejection}"
    )))
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "leaderboard-server",
        "version": APP_VERSION,
    }))
}

/// GET /:service/leaderboards/:board
async fn api_board_status(
    State(state): State<AppState>,
    Path((service, board)): Path<(String, String)>,
) -> Json<serde_json::Value> {
    let cardinality = state.engine.cardinality(&BoardKey::new(service, board));
    Json(serde_json::json!({ "cardinality": cardinality }))
}

#[derive(Deserialize)]
struct MemberParams {
    #[serde(default)]
    properties: bool,
}

/// GET /:service/leaderboards/:board/:member
async fn api_member_rank(
    State(state): State<AppState>,
    Path((service, board, member)): Path<(String, String, String)>,
    Query(params): Query<MemberParams>,
) -> ApiResult<Json<RankedEntry>> {
    let key = BoardKey::new(service.clone(), board);
    let mut entry = WindowQuery::new(&state.engine).rank(&key, &member)?;

    if params.properties {
        decorate_entries(state.overlay.as_ref(), &service, std::slice::from_mut(&mut entry))
            .await?;
    }

    Ok(Json(entry))
}

#[derive(Deserialize)]
struct SubmitBody {
    score: i64,
}

/// PUT /:service/leaderboards/:board/:member
async fn api_put_score(
    State(state): State<AppState>,
    Path((service, board, member)): Path<(String, String, String)>,
    body: Result<Json<SubmitBody>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Json(body) = body.map_err(bad_body)?;
    let key = BoardKey::new(service, board);
    let outcome = UpdatePolicy::new(&state.engine, state.policy).submit(&key, &member, body.score)?;
    Ok(Json(serde_json::json!({
        "accepted": outcome.accepted,
        "prevScore": outcome.previous_score,
    })))
}

/// DELETE /:service/leaderboards/:board/:member
async fn api_remove_member(
    State(state): State<AppState>,
    Path((service, board, member)): Path<(String, String, String)>,
) -> StatusCode {
    state
        .engine
        .remove_member(&BoardKey::new(service, board), &member);
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
struct TopParams {
    limit: Option<i64>,
    offset: Option<i64>,
    #[serde(default)]
    properties: bool,
}

/// GET /:service/leaderboards/:board/top
async fn api_top_scores(
    State(state): State<AppState>,
    Path((service, board)): Path<(String, String)>,
    Query(params): Query<TopParams>,
) -> ApiResult<Json<Vec<RankedEntry>>> {
    let key = BoardKey::new(service.clone(), board);
    let mut entries =
        WindowQuery::new(&state.engine).top_range(&key, params.offset, params.limit)?;

    if params.properties {
        decorate_entries(state.overlay.as_ref(), &service, &mut entries).await?;
    }

    Ok(Json(entries))
}

#[derive(Deserialize)]
struct AroundParams {
    limit: Option<i64>,
    #[serde(default)]
    properties: bool,
}

/// GET /:service/leaderboards/:board/:member/around
async fn api_around_scores(
    State(state): State<AppState>,
    Path((service, board, member)): Path<(String, String, String)>,
    Query(params): Query<AroundParams>,
) -> ApiResult<Json<Vec<RankedEntry>>> {
    let key = BoardKey::new(service.clone(), board);
    let mut entries = WindowQuery::new(&state.engine).window(&key, &member, params.limit)?;

    if params.properties {
        decorate_entries(state.overlay.as_ref(), &service, &mut entries).await?;
    }

    Ok(Json(entries))
}

#[derive(Deserialize)]
struct PropertiesBody {
    properties: serde_json::Value,
}

/// PUT /:service/users/:member
async fn api_put_properties(
    State(state): State<AppState>,
    Path((service, member)): Path<(String, String)>,
    body: Result<Json<PropertiesBody>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(body) = body.map_err(bad_body)?;
    let blob = serde_json::to_string(&body.properties)
        .map_err(|e| ApiError(EngineError::invalid(format!("properties not serializable: {e}"))))?;
    state.overlay.set(&service, &member, &blob).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /:service/leaderboards/:board
async fn api_delete_board(
    State(state): State<AppState>,
    Path((service, board)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let credential = headers
        .get("X-Auth")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    state
        .engine
        .delete_leaderboard(&BoardKey::new(service, board), credential)?;
    Ok(StatusCode::NO_CONTENT)
}
