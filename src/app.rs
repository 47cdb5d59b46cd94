use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::DashboardConfig;
use crate::downloader;
use crate::filter::{FilterOptions, FilterRequest, apply};
use crate::format::KpiDisplay;
use crate::graph::{ChartKind, render_chart};
use crate::loader;
use crate::record::Dataset;
use crate::session::{SESSION_COOKIE, SessionStore};
use crate::view::{DashboardView, compute_view};

/// Shown in place of the dashboard until a file has been uploaded.
pub const WAITING_MESSAGE: &str = "Aguardando upload da base de dados...";

pub struct AppState {
    sessions: SessionStore,
    config: DashboardConfig,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        AppState {
            sessions: SessionStore::new(config.session_ttl),
            config,
        }
    }
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct UploadResponse {
    status: &'static str,
    rows: usize,
    options: FilterOptions,
}

#[derive(Serialize)]
struct OptionsResponse {
    status: &'static str,
    options: FilterOptions,
}

#[derive(Serialize)]
struct ViewResponse {
    status: &'static str,
    display: KpiDisplay,
    view: DashboardView,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum ExportFormat {
    Csv,
    Xlsx,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: ExportFormat,
}

/// Build the dashboard router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/upload", post(upload_dataset))
        .route("/api/options", get(get_options))
        .route("/api/view", post(get_view))
        .route("/api/chart/:kind", post(get_chart))
        .route("/api/export", post(export_rows))
        .nest_service("/static", static_dir)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let address = config.bind_address();
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(&address).await?;
    info!("Dashboard listening on http://{}", address);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().map(str::to_string);
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, bytes.to_vec())),
                    Err(e) => return error_response(e.status(), "upload", e.body_text()),
                }
            }
            Ok(None) => break,
            Err(e) => return error_response(e.status(), "upload", e.body_text()),
        }
    }

    let Some((filename, bytes)) = upload.filter(|(_, bytes)| !bytes.is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "upload",
            "No file data received".to_string(),
        );
    };

    let purged = state.sessions.purge_expired();
    if purged > 0 {
        debug!("purged {} expired sessions", purged);
    }

    let name = filename.clone().unwrap_or_default();
    let loaded =
        tokio::task::spawn_blocking(move || loader::load_upload(filename.as_deref(), bytes)).await;

    let dataset = match loaded {
        Ok(Ok(dataset)) => dataset,
        Ok(Err(e)) => {
            // The session keeps whatever dataset it had before.
            warn!("rejected upload {:?}: {}", name, e);
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.kind(), e.to_string());
        }
        Err(e) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string());
        }
    };

    let session_id = match jar.get(SESSION_COOKIE) {
        Some(cookie) if state.sessions.is_valid(cookie.value()) => cookie.value().to_string(),
        _ => state.sessions.create(),
    };

    let rows = dataset.len();
    let options = FilterOptions::from_dataset(&dataset);
    state.sessions.replace_dataset(&session_id, dataset);
    info!("loaded {} sales rows from {:?}", rows, name);

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .build();

    (
        jar.add(cookie),
        Json(UploadResponse {
            status: "ok",
            rows,
            options,
        }),
    )
        .into_response()
}

async fn get_options(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(dataset) = session_dataset(&state, &jar) else {
        return waiting_response();
    };

    Json(OptionsResponse {
        status: "ok",
        options: FilterOptions::from_dataset(&dataset),
    })
    .into_response()
}

async fn get_view(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<FilterRequest>,
) -> Response {
    let Some(dataset) = session_dataset(&state, &jar) else {
        return waiting_response();
    };

    let criteria = request.into_criteria(&dataset);
    let view = compute_view(&dataset, &criteria);

    Json(ViewResponse {
        status: "ok",
        display: KpiDisplay::from_kpis(&view.kpis),
        view,
    })
    .into_response()
}

async fn get_chart(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(kind): Path<String>,
    Json(request): Json<FilterRequest>,
) -> Response {
    let Some(chart) = ChartKind::from_slug(&kind) else {
        return error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("Unknown chart: {}", kind),
        );
    };
    let Some(dataset) = session_dataset(&state, &jar) else {
        return waiting_response();
    };

    let view = compute_view(&dataset, &request.into_criteria(&dataset));
    let rendered = render_chart(
        &view,
        chart,
        state.config.chart_width,
        state.config.chart_height,
    )
    .map_err(|e| e.to_string());

    match rendered {
        Ok(svg) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(message) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "render", message),
    }
}

async fn export_rows(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(query): Query<ExportQuery>,
    Json(request): Json<FilterRequest>,
) -> Response {
    let Some(dataset) = session_dataset(&state, &jar) else {
        return waiting_response();
    };

    let criteria = request.into_criteria(&dataset);
    let filtered = apply(&dataset, &criteria);
    let (exported, content_type, filename) = match query.format {
        ExportFormat::Csv => (
            downloader::to_csv(&filtered),
            "text/csv; charset=utf-8",
            "vendas_filtradas.csv",
        ),
        ExportFormat::Xlsx => (
            downloader::to_xlsx(&filtered),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "vendas_filtradas.xlsx",
        ),
    };

    match exported.map_err(|e| e.to_string()) {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(message) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "export", message),
    }
}

fn session_dataset(state: &AppState, jar: &CookieJar) -> Option<Arc<Dataset>> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.dataset(cookie.value()))
}

fn waiting_response() -> Response {
    Json(StatusResponse {
        status: "waiting",
        message: WAITING_MESSAGE,
    })
    .into_response()
}

fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            status: "error",
            kind,
            message,
        }),
    )
        .into_response()
}
