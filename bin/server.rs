// Budget Ledger - Web Server
// HTTP transport over the same chat front-end and ledger store

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use budget_ledger::{
    init_tracing, Bot, Config, LedgerError, LedgerStore, MonthlyReport, OwnerId, Reply,
    SqliteStore, Transaction,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    bot: Arc<Bot<SqliteStore>>,
    default_limit: NonZeroU32,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Transaction response (timestamps as second-precision UTC strings)
#[derive(Serialize)]
struct TransactionResponse {
    id: i64,
    amount: f64,
    direction: String,
    label: String,
    note: String,
    recorded_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            amount: tx.amount,
            direction: tx.direction.to_string(),
            recorded_at: tx.recorded_at_iso(),
            label: tx.label,
            note: tx.note,
        }
    }
}

#[derive(Serialize)]
struct ReportResponse {
    income: f64,
    expense: f64,
    balance: f64,
    #[serde(flatten)]
    report: MonthlyReport,
}

#[derive(Deserialize)]
struct MessageRequest {
    text: String,
}

#[derive(Deserialize)]
struct CallbackRequest {
    data: String,
}

#[derive(Deserialize)]
struct ListQuery {
    limit: Option<u32>,
}

fn error_response(err: LedgerError) -> Response {
    let status = match err {
        LedgerError::InvalidPeriod(_)
        | LedgerError::InvalidAmount(_)
        | LedgerError::Unparsable => StatusCode::BAD_REQUEST,
        LedgerError::StorageUnavailable(_) => {
            tracing::warn!(error = %err, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(ApiResponse::<()>::err(err.to_string()))).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// POST /api/users/:owner/messages - Free text or slash command
async fn post_message(
    State(state): State<AppState>,
    Path(owner): Path<OwnerId>,
    Json(body): Json<MessageRequest>,
) -> Json<ApiResponse<Reply>> {
    let bot = state.bot.clone();
    let reply = tokio::task::spawn_blocking(move || bot.handle_message(owner, &body.text))
        .await
        .unwrap_or_else(|e| Reply::text(format!("internal error: {}", e)));

    Json(ApiResponse::ok(reply))
}

/// POST /api/users/:owner/callbacks - Quick-add button press
async fn post_callback(
    State(state): State<AppState>,
    Path(owner): Path<OwnerId>,
    Json(body): Json<CallbackRequest>,
) -> Json<ApiResponse<Reply>> {
    let bot = state.bot.clone();
    let reply = tokio::task::spawn_blocking(move || bot.handle_callback(owner, &body.data))
        .await
        .unwrap_or_else(|e| Reply::text(format!("internal error: {}", e)));

    Json(ApiResponse::ok(reply))
}

/// GET /api/users/:owner/transactions?limit=N - Most recent first
async fn get_transactions(
    State(state): State<AppState>,
    Path(owner): Path<OwnerId>,
    Query(query): Query<ListQuery>,
) -> Response {
    let limit = match query.limit {
        None => state.default_limit,
        Some(n) => match NonZeroU32::new(n) {
            Some(n) => n,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::<()>::err("limit must be positive".to_string())),
                )
                    .into_response()
            }
        },
    };

    let bot = state.bot.clone();
    match tokio::task::spawn_blocking(move || bot.store().list(owner, limit)).await {
        Ok(Ok(transactions)) => {
            let response: Vec<TransactionResponse> =
                transactions.into_iter().map(|tx| tx.into()).collect();
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(LedgerError::StorageUnavailable(e.to_string())),
    }
}

/// GET /api/users/:owner/reports/:year/:month - Monthly totals
async fn get_report(
    State(state): State<AppState>,
    Path((owner, year, month)): Path<(OwnerId, i32, u32)>,
) -> Response {
    let bot = state.bot.clone();
    match tokio::task::spawn_blocking(move || bot.store().monthly_report(owner, year, month)).await {
        Ok(Ok(report)) => {
            let response = ReportResponse {
                income: report.income(),
                expense: report.expense(),
                balance: report.balance(),
                report,
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Ok(Err(e)) => error_response(e),
        Err(e) => error_response(LedgerError::StorageUnavailable(e.to_string())),
    }
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config.log_filter);

    let store = SqliteStore::open(&config.db_path)?;
    let default_limit = NonZeroU32::new(config.list_limit)
        .ok_or_else(|| anyhow::anyhow!("list_limit must be positive"))?;

    // Create shared state
    let state = AppState {
        bot: Arc::new(Bot::new(Arc::new(store), default_limit)),
        default_limit,
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users/:owner/messages", post(post_message))
        .route("/users/:owner/callbacks", post(post_callback))
        .route("/users/:owner/transactions", get(get_transactions))
        .route("/users/:owner/reports/:year/:month", get(get_report))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
