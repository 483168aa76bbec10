//! File Analyzer - upload a document, run two text completions over it, download a report.

mod analysis;
mod completion;
mod config;
mod extractor;
mod report;
mod ui;

use analysis::{Analysis, AnalyzeError, Analyzer, ApiKeys};
use axum::{
    extract::{DefaultBodyLimit, Form, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use config::AppConfig;
use extractor::UploadedFile;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<AppConfig>,
    http: reqwest::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "file_analyzer=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Providers: openai={} anthropic={} (timeout: {:?})",
        config.openai_base_url, config.anthropic_base_url, config.provider_timeout
    );

    let state = AppState {
        http: config.http_client()?,
        config: Arc::new(config),
    };
    let bind = state.config.bind;

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Server listening on http://{}", bind);
    axum::serve(listener, app(state)).await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/analyze", post(analyze_page))
        .route("/api/analyze", post(analyze_json))
        .route("/report", post(download_report))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Upload form.
async fn index() -> Response {
    ui::render(&ui::IndexPage)
}

/// Analyze an upload and render the results page.
async fn analyze_page(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    match analyze(&state, multipart).await {
        Ok(analysis) => ui::render(&ui::AnalysisPage::new(&analysis)),
        Err((status, message)) => {
            (status, ui::render(&ui::ErrorPage { message: &message })).into_response()
        }
    }
}

/// Analyze an upload and return the analysis as JSON.
async fn analyze_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Analysis>, (StatusCode, String)> {
    analyze(&state, multipart).await.map(Json)
}

#[derive(serde::Deserialize)]
struct ReportForm {
    report: String,
}

/// Serve a rendered report as `analysis_report.txt`.
async fn download_report(Form(form): Form<ReportForm>) -> Response {
    // Browsers submit textual form values with CRLF line breaks.
    let body = form.report.replace("\r\n", "\n");

    (
        [
            (
                header::CONTENT_TYPE,
                format!("{}; charset=utf-8", report::REPORT_MIME),
            ),
            (header::CONTENT_DISPOSITION, ui::report_disposition()),
        ],
        body,
    )
        .into_response()
}

// ============================================================================
// Helper functions
// ============================================================================

/// Fields submitted by the upload form.
struct AnalyzeForm {
    keys: ApiKeys,
    intent: String,
    file: Option<UploadedFile>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, (StatusCode, String)> {
    let mut form = AnalyzeForm {
        keys: ApiKeys::default(),
        intent: String::new(),
        file: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (StatusCode::BAD_REQUEST, format!("Multipart error: {}", e))
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let filename = field.file_name().unwrap_or("document").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(|e| {
                (StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
            })?;
            form.file = Some(UploadedFile {
                filename,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field.text().await.map_err(|e| {
            (StatusCode::BAD_REQUEST, format!("Failed to read field {}: {}", name, e))
        })?;

        match name.as_str() {
            "openai_api_key" => form.keys.openai = value.trim().to_string(),
            "claude_api_key" => form.keys.claude = value.trim().to_string(),
            "intent" => form.intent = value,
            _ => {}
        }
    }

    Ok(form)
}

async fn analyze(state: &AppState, multipart: Multipart) -> Result<Analysis, (StatusCode, String)> {
    let form = read_form(multipart).await?;

    // An empty file part still goes through extraction and is rejected there.
    let Some(file) = form.file else {
        return Err((StatusCode::BAD_REQUEST, "No file uploaded".to_string()));
    };

    info!("Received file: {} ({} bytes)", file.filename, file.data.len());

    let analyzer = Analyzer::for_request(&state.config, &state.http, &form.keys);
    analyzer.run(&file, &form.intent).await.map_err(|e| {
        let status = match &e {
            AnalyzeError::Unsupported | AnalyzeError::Extraction(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AnalyzeError::Provider { .. } => {
                error!("Analysis failed: {}", e);
                StatusCode::BAD_GATEWAY
            }
        };
        (status, e.to_string())
    })
}
