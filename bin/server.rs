// AutoFinance - Web Server
// REST API over the ledger with Axum

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

use autofinance::{
    bootstrap, compose, custom_report, delete_matching, insert_batch, list_categories, logging,
    main_report, parse_lines, peek, read_custom, read_delete, read_insert, write_backup,
    CategoryRegistry, Config, CustomReport, LedgerError, MainReport, Params, StoredRecord,
    DEFAULT_DELIMITER, DEFAULT_PEEK_LIMIT,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    registry: Arc<CategoryRegistry>,
}

impl AppState {
    fn ledger(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("ledger lock poisoned"))
    }
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
}

impl ApiResponse<()> {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Validation failures are the caller's fault; everything else is ours
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if err.is_validation() {
            ApiError::bad_request(err.to_string())
        } else {
            tracing::error!(error = %err, "request failed");
            ApiError::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::failure(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Deserialize)]
struct PeekParams {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct ImportParams {
    delimiter: Option<String>,
}

#[derive(Serialize)]
struct InsertResponse {
    inserted: usize,
}

#[derive(Serialize)]
struct ImportResponse {
    inserted: usize,
    rejected: Vec<RejectedLine>,
}

#[derive(Serialize)]
struct RejectedLine {
    line: usize,
    content: String,
    error: String,
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/report - Whole-ledger overview
async fn get_report(State(state): State<AppState>) -> ApiResult<MainReport> {
    let conn = state.ledger()?;
    let today = chrono::Local::now().date_naive();
    let report = main_report(&conn, &state.registry, today)?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/records?limit=N - Most recent records (30 by default)
async fn get_records(
    State(state): State<AppState>,
    Query(params): Query<PeekParams>,
) -> ApiResult<Vec<StoredRecord>> {
    let limit = params.limit.unwrap_or(DEFAULT_PEEK_LIMIT);
    let conn = state.ledger()?;
    let records = peek(&conn, Some(limit))?;
    Ok(Json(ApiResponse::ok(records)))
}

/// POST /api/records - Insert one record from form-style fields
async fn post_record(
    State(state): State<AppState>,
    Json(params): Json<Params>,
) -> ApiResult<InsertResponse> {
    let record = read_insert(&params, &state.registry)?;
    let mut conn = state.ledger()?;
    let inserted = insert_batch(&mut conn, std::slice::from_ref(&record))?;
    Ok(Json(ApiResponse::ok(InsertResponse { inserted })))
}

/// POST /api/import?delimiter=C - Bulk import from a text body
async fn post_import(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> ApiResult<ImportResponse> {
    let delimiter = match params.delimiter.as_deref() {
        None | Some("") => DEFAULT_DELIMITER,
        Some(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(ApiError::bad_request("delimiter must be a single character")),
            }
        }
    };

    let report = parse_lines(body.lines(), &state.registry, delimiter);
    let mut conn = state.ledger()?;
    let inserted = insert_batch(&mut conn, &report.records)?;

    let rejected = report
        .failures
        .into_iter()
        .map(|failure| RejectedLine {
            line: failure.line,
            content: failure.content,
            error: failure.error.to_string(),
        })
        .collect();

    Ok(Json(ApiResponse::ok(ImportResponse { inserted, rejected })))
}

/// POST /api/custom - Report over a custom filter
async fn post_custom(
    State(state): State<AppState>,
    Json(params): Json<Params>,
) -> ApiResult<CustomReport> {
    let query = read_custom(&params)?;
    let conn = state.ledger()?;
    let report = custom_report(&conn, &state.registry, &query)?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/delete - Delete records matching category and dates
async fn post_delete(
    State(state): State<AppState>,
    Json(params): Json<Params>,
) -> ApiResult<DeleteResponse> {
    let criteria = read_delete(&params)?;
    let predicate = compose(&criteria, &state.registry)?;
    let mut conn = state.ledger()?;
    let deleted = delete_matching(&mut conn, &predicate)?;
    Ok(Json(ApiResponse::ok(DeleteResponse { deleted })))
}

/// GET /api/backup - Pipe-delimited dump of the ledger
async fn get_backup(State(state): State<AppState>) -> Result<Response, ApiError> {
    let conn = state.ledger()?;
    let mut buffer: Vec<u8> = Vec::new();
    write_backup(&conn, &mut buffer)?;

    let body = String::from_utf8_lossy(&buffer).into_owned();
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"backup.txt\""),
        ],
        body,
    )
        .into_response())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    println!("🌐 AutoFinance - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env();
    let conn = bootstrap(&config)
        .with_context(|| format!("Failed to open ledger at {}", config.database.display()))?;
    let registry = list_categories(&conn)?;
    println!("✓ Ledger opened: {}", config.database.display());

    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        registry: Arc::new(registry),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/report", get(get_report))
        .route("/records", get(get_records).post(post_record))
        .route("/import", post(post_import))
        .route("/custom", post(post_custom))
        .route("/delete", post(post_delete))
        .route("/backup", get(get_backup))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    println!("\n🚀 Server running on http://{}", config.bind_addr);
    println!("   API: http://{}/api/report", config.bind_addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server stopped")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autofinance::{read_insert, setup_database};

    fn state_with(count: usize) -> AppState {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        let registry = list_categories(&conn).unwrap();

        let records: Vec<_> = (0..count)
            .map(|day| {
                let params: Params = [
                    ("category", "Pleasure".to_string()),
                    ("description", format!("Coffee {}", day)),
                    ("amount", "-3.5".to_string()),
                    ("date", format!("2024-01-{:02}", day % 28 + 1)),
                ]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
                read_insert(&params, &registry).unwrap()
            })
            .collect();
        insert_batch(&mut conn, &records).unwrap();

        AppState {
            db: Arc::new(Mutex::new(conn)),
            registry: Arc::new(registry),
        }
    }

    async fn listed(state: AppState, limit: Option<usize>) -> usize {
        let Ok(Json(response)) = get_records(State(state), Query(PeekParams { limit })).await else {
            panic!("listing records failed");
        };
        response.data.map(|records| records.len()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_records_listing_defaults_to_thirty() {
        assert_eq!(listed(state_with(35), None).await, DEFAULT_PEEK_LIMIT);
        assert_eq!(listed(state_with(35), Some(5)).await, 5);
        assert_eq!(listed(state_with(35), Some(100)).await, 35);
        assert_eq!(listed(state_with(3), None).await, 3);
    }
}
