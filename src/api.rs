// 🌐 REST API with Axum
// Every response uses the { success, data, error } envelope

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog;
use crate::db;
use crate::entities::{AiPrompt, PromptField, Vendor};
use crate::error::TenderError;
use crate::filter::{organizations, FilterSelection, Selection};
use crate::paginate::Page;
use crate::sort::{SortConfig, SortField, SortOrder};
use crate::ted::FeedClient;
use crate::tender::{NewTender, TenderRecord, TenderSummary, TenderUpdate};
use crate::view::{compose, ListQuery, ListView, Presentation, RowTarget};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    /// `None` disables `POST /api/ted/refresh`
    pub feed: Option<Arc<FeedClient>>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(conn: Connection, feed: Option<FeedClient>, page_size: usize) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            feed: feed.map(Arc::new),
            page_size,
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = match err.downcast_ref::<TenderError>() {
            Some(TenderError::Validation(_)) | Some(TenderError::Range(_)) => StatusCode::BAD_REQUEST,
            Some(TenderError::NotFound(_)) => StatusCode::NOT_FOUND,
            Some(TenderError::Feed(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(status, format!("{:#}", err))
    }
}

impl From<TenderError> for ApiError {
    fn from(err: TenderError) -> Self {
        anyhow::Error::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message, "request rejected");
        }
        (self.status, Json(ApiResponse::<()>::failed(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

// ============================================================================
// Request / response shapes
// ============================================================================

/// Query string for GET /api/tenders
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub organization: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub view: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Result<ListQuery, ApiError> {
        let status = Selection::parse_status(self.status.as_deref().unwrap_or(""))
            .map_err(|e| ApiError::bad_request(e.to_string()))?;
        let organization = Selection::parse_organization(self.organization.as_deref().unwrap_or(""));

        let order = match self.order.as_deref() {
            Some(raw) => raw.parse::<SortOrder>().map_err(ApiError::bad_request)?,
            None => SortOrder::default(),
        };
        let sort = match self.sort.as_deref() {
            Some(raw) => Some(SortConfig::new(
                raw.parse::<SortField>().map_err(ApiError::bad_request)?,
                order,
            )),
            None => None,
        };

        let presentation = match self.view.as_deref() {
            Some(raw) => raw.parse::<Presentation>().map_err(ApiError::bad_request)?,
            None => Presentation::default(),
        };

        Ok(ListQuery {
            filter: FilterSelection {
                status,
                organization,
                search_text: self.search.unwrap_or_default(),
            },
            sort,
            page: None,
            presentation,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TenderListResponse {
    #[serde(flatten)]
    pub view: ListView,
    /// Organization picker options (from the unfiltered snapshot)
    pub organizations: Vec<String>,
    /// Rows dropped at the fetch boundary
    pub rejected: usize,
}

#[derive(Debug, Serialize)]
pub struct TenderDetailResponse {
    #[serde(flatten)]
    pub tender: TenderRecord,
    pub target: RowTarget,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub adapter: String,
    pub synced: usize,
    pub skipped: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PromptBody {
    pub prompt_text: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/tenders - filtered, sorted local tenders
async fn list_tenders(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<TenderListResponse> {
    let query = params.into_query()?;
    let (rows, issues) = {
        let conn = state.conn()?;
        catalog::local_snapshot(&conn)?
    };

    let view = compose(&rows, &query).map_err(TenderError::from)?;
    Ok(Json(ApiResponse::ok(TenderListResponse {
        view,
        organizations: organizations(&rows),
        rejected: issues.iter().filter(|i| i.rejected).count(),
    })))
}

/// GET /api/tenders/:id
async fn get_tender(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<TenderDetailResponse> {
    let conn = state.conn()?;
    let tender = db::get_tender(&conn, &id)?.ok_or(TenderError::NotFound(id))?;
    let target = RowTarget::editor(&tender.id);

    Ok(Json(ApiResponse::ok(TenderDetailResponse { tender, target })))
}

/// POST /api/tenders
async fn create_tender(
    State(state): State<AppState>,
    Json(input): Json<NewTender>,
) -> Result<(StatusCode, Json<ApiResponse<TenderRecord>>), ApiError> {
    let conn = state.conn()?;
    let record = db::insert_tender(&conn, input, "api")?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))))
}

/// PUT /api/tenders/:id
async fn update_tender(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<TenderUpdate>,
) -> ApiResult<TenderRecord> {
    let conn = state.conn()?;
    let record = db::update_tender(&conn, &id, &update, "api")?;
    Ok(Json(ApiResponse::ok(record)))
}

/// GET /api/ted?page=N - one page of the external feed
async fn ted_tenders(State(state): State<AppState>, Query(params): Query<PageParams>) -> ApiResult<Page<TenderSummary>> {
    let conn = state.conn()?;
    let page = catalog::ted_page(&conn, params.page.unwrap_or(1), state.page_size)?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/ted/refresh - pull the latest notices from the registry
async fn ted_refresh(State(state): State<AppState>) -> ApiResult<RefreshResponse> {
    let feed = state
        .feed
        .clone()
        .ok_or_else(|| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "feed sync is not configured"))?;

    let batch = feed.fetch_latest().await?;

    let synced = if batch.is_empty() {
        0
    } else {
        let conn = state.conn()?;
        db::upsert_ted_tenders(&conn, &batch.tenders, feed.adapter_version())?
    };

    let message = if synced == 0 {
        "No tenders found in TED response".to_string()
    } else {
        format!("Successfully synced {} tenders", synced)
    };
    tracing::info!(synced, skipped = batch.skipped.len(), "feed refresh finished");

    Ok(Json(ApiResponse::ok(RefreshResponse {
        adapter: feed.adapter_version().to_string(),
        synced,
        skipped: batch.skipped.len(),
        message,
    })))
}

/// GET /api/vendors - validated vendor profiles
async fn list_vendors(State(state): State<AppState>) -> ApiResult<Vec<Vendor>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(db::get_validated_vendors(&conn)?)))
}

/// GET /api/prompts
async fn list_prompts(State(state): State<AppState>) -> ApiResult<Vec<AiPrompt>> {
    let conn = state.conn()?;
    Ok(Json(ApiResponse::ok(db::get_ai_prompts(&conn, &[])?)))
}

/// PUT /api/prompts/:field
async fn save_prompt(
    State(state): State<AppState>,
    Path(field): Path<String>,
    Json(body): Json<PromptBody>,
) -> ApiResult<AiPrompt> {
    let field = field.parse::<PromptField>().map_err(ApiError::bad_request)?;
    if body.prompt_text.trim().is_empty() {
        return Err(ApiError::bad_request("prompt_text must not be empty"));
    }

    let conn = state.conn()?;
    db::upsert_ai_prompt(&conn, &AiPrompt::new(field, body.prompt_text.trim()), "api")?;
    let stored = db::get_ai_prompts(&conn, &[field.as_str()])?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal(format!("prompt {} missing after save", field.as_str())))?;
    Ok(Json(ApiResponse::ok(stored)))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/tenders", get(list_tenders).post(create_tender))
        .route("/tenders/:id", get(get_tender).put(update_tender))
        .route("/ted", get(ted_tenders))
        .route("/ted/refresh", post(ted_refresh))
        .route("/vendors", get(list_vendors))
        .route("/prompts", get(list_prompts))
        .route("/prompts/:field", put(save_prompt))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
