#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::Query;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

use crate::analysis::{Analysis, BrandSelection, Budget, BudgetError, analyze, brand_options};
use crate::config::ServerConfig;
use crate::downloader;
use crate::graph::{BrandPalette, DashboardView, render_view};
use crate::listing::{CleanedTable, CleaningReport};
use crate::loader;
use crate::session::SessionStore;

const SESSION_COOKIE: &str = "session";
const UPLOAD_FIELD: &str = "file";

const IDLE_MESSAGE: &str = "Please upload the vehicle listing spreadsheet to begin analysis.";
const NO_DATA_MESSAGE: &str =
    "No data available for selected brand(s). Please choose a different brand.";

pub struct AppState {
    pub sessions: SessionStore,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl, config.max_sessions),
            config,
        }
    }
}

/// Brand selection and budget, as sent by the dashboard controls.
///
/// Each selected brand is its own `brands` parameter (`?brands=Hero&brands=TVS`) and
/// is matched exactly. Leaving `brands` out selects every brand; a single empty
/// `brands=` selects none.
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub brands: Vec<String>,
    pub budget: Option<i64>,
}

impl ViewQuery {
    pub fn selection(&self) -> BrandSelection {
        if self.brands.is_empty() {
            return BrandSelection::All;
        }
        BrandSelection::only(
            self.brands
                .iter()
                .filter(|brand| !brand.is_empty())
                .cloned(),
        )
    }

    pub fn budget(&self) -> Result<Budget, BudgetError> {
        self.budget.map_or(Ok(Budget::default()), Budget::new)
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    status: String,
    message: String,
    report: CleaningReport,
    brands: Vec<String>,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(StatusResponse {
            status: "error".to_string(),
            message: Some(message.into()),
        }),
    )
        .into_response()
}

fn idle_response() -> Response {
    Json(serde_json::json!({
        "state": "idle",
        "message": IDLE_MESSAGE,
    }))
    .into_response()
}

fn no_data_response() -> Response {
    Json(serde_json::json!({
        "state": "no_data",
        "message": NO_DATA_MESSAGE,
    }))
    .into_response()
}

pub fn router(state: Arc<AppState>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/upload", post(upload_listing))
        .route("/api/brands", get(list_brands))
        .route("/api/analysis", get(run_analysis))
        .route("/api/chart/:view", get(render_chart))
        .route("/api/export/xlsx", get(export_xlsx))
        .route("/api/export/csv", get(export_csv))
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(max_upload_bytes))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.addr;
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn session_table(state: &AppState, jar: &CookieJar) -> Option<Arc<CleanedTable>> {
    let cookie = jar.get(SESSION_COOKIE)?;
    state.sessions.table(cookie.value())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn upload_listing(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(UPLOAD_FIELD) {
                    continue;
                }
                let file_name = field.file_name().unwrap_or("upload.xlsx").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((file_name, bytes.to_vec())),
                    Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
                }
            }
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, e.body_text()),
        }
    }

    let Some((file_name, bytes)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "No file data received");
    };

    let (table, report) = match loader::load_table_from_bytes(&file_name, bytes) {
        Ok(loaded) => loaded,
        Err(e) => {
            warn!("rejected upload {}: {}", file_name, e);
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to load {}: {}", file_name, e),
            );
        }
    };

    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .unwrap_or_else(SessionStore::new_session_id);
    let brands = brand_options(&table);
    state.sessions.store(&session_id, table);
    info!(
        "upload {} stored: {} of {} rows retained",
        file_name, report.rows_retained, report.rows_read
    );

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true);

    (
        jar.add(cookie),
        Json(UploadResponse {
            status: "ok".to_string(),
            message: report.message(),
            report,
            brands,
        }),
    )
        .into_response()
}

async fn list_brands(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    match session_table(&state, &jar) {
        Some(table) => Json(brand_options(&table)).into_response(),
        None => idle_response(),
    }
}

async fn run_analysis(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<ViewQuery>,
) -> Response {
    let budget = match query.budget() {
        Ok(budget) => budget,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let Some(table) = session_table(&state, &jar) else {
        return idle_response();
    };

    match analyze(&table, &query.selection(), budget) {
        Analysis::NoData => no_data_response(),
        views => Json(views).into_response(),
    }
}

async fn render_chart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(view): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let view: DashboardView = match view.parse() {
        Ok(view) => view,
        Err(message) => return error_response(StatusCode::NOT_FOUND, message),
    };
    let budget = match query.budget() {
        Ok(budget) => budget,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let Some(table) = session_table(&state, &jar) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let analysis = analyze(&table, &query.selection(), budget);
    let Some(views) = analysis.views() else {
        return StatusCode::NO_CONTENT.into_response();
    };

    let palette = BrandPalette::new(brand_options(&table));
    match render_view(view, views, &palette) {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn export_xlsx(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<ViewQuery>,
) -> Response {
    let budget = match query.budget() {
        Ok(budget) => budget,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };
    let Some(table) = session_table(&state, &jar) else {
        return idle_response();
    };

    let analysis = analyze(&table, &query.selection(), budget);
    let Some(views) = analysis.views() else {
        return no_data_response();
    };

    match downloader::to_xlsx(views) {
        Ok(bytes) => (
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"two_wheeler_views.xlsx\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn export_csv(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(table) = session_table(&state, &jar) else {
        return idle_response();
    };

    match downloader::to_csv(&table) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"cleaned_listings.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
