//! Servidor web Axum que projeta documentos pré-anotados sobre o modelo de spans

mod config;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use nlp_core::{Analyzer, AnnotatedDocument, Error, Span, TagKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Estado compartilhado da aplicação
struct AppState {
    analyzer: Analyzer,
}

#[derive(Deserialize)]
struct ProjectRequest {
    language: String,
    text: String,
    #[serde(default)]
    document: AnnotatedDocument,
}

#[derive(Serialize)]
struct ProjectResponse<'a> {
    language: &'a str,
    text: &'a str,
    spans: Vec<&'a Span>,
    processing_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let analyzer = settings.build_analyzer()?;
    info!("Idiomas configurados: {:?}", analyzer.projector().registry().languages());
    let state = Arc::new(AppState { analyzer });

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;
    info!("🚀 Servidor NLP iniciado em http://{}", settings.addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/languages", get(languages_handler))
        .route("/tagsets/:language/adhoc", get(adhoc_handler))
        .route("/project", post(project_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Idiomas com tagsets canônicos
async fn languages_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({"languages": state.analyzer.projector().registry().languages()}))
}

/// Tags ad-hoc criadas até agora para um idioma, por dimensão
async fn adhoc_handler(
    State(state): State<Arc<AppState>>,
    Path(language): Path<String>,
) -> Response {
    let resolver = match state.analyzer.projector().registry().resolver(&language) {
        Ok(resolver) => resolver,
        Err(err) => return error_response(err),
    };
    let mut body = serde_json::Map::new();
    body.insert("language".into(), resolver.language().into());
    for kind in TagKind::all() {
        let tags: Vec<String> = resolver.adhoc_tags(kind).iter().map(|t| t.tag.clone()).collect();
        body.insert(kind.name().into(), serde_json::json!(tags));
    }
    Json(serde_json::Value::Object(body)).into_response()
}

/// Projeção de um documento pré-anotado (síncrona, fora do runtime)
async fn project_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProjectRequest>,
) -> Response {
    let registry = state.analyzer.projector().registry();
    if !registry.is_configured(&req.language) {
        return error_response(match nlp_core::registry::normalize_language(&req.language) {
            Ok(language) => Error::UnsupportedLanguage {
                language,
                supported: registry.languages(),
            },
            Err(err) => err,
        });
    }

    info!(
        "Projetando documento em '{}': {} chars, {} sentença(s)",
        req.language,
        req.text.chars().count(),
        req.document.sentences.len()
    );
    let started = Instant::now();
    let worker = Arc::clone(&state);
    let handle = tokio::task::spawn_blocking(move || {
        let result = worker.analyzer.project(&req.language, &req.text, &req.document);
        (req.language, result)
    });

    match handle.await {
        Ok((language, Ok(at))) => Json(ProjectResponse {
            language: &language,
            text: at.text(),
            spans: at.spans(),
            processing_ms: started.elapsed().as_millis() as u64,
        })
        .into_response(),
        Ok((_, Err(err))) => error_response(err),
        Err(join) => {
            warn!("Tarefa de projeção abortada: {}", join);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Falha interna na projeção"})),
            )
                .into_response()
        }
    }
}

fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::UnsupportedLanguage { .. } | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::InvalidDocument(_) | Error::InvalidSpan { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!("Requisição rejeitada ({}): {}", status, err);
    let body = match &err {
        Error::UnsupportedLanguage { supported, .. } => {
            serde_json::json!({"error": err.to_string(), "supported": supported})
        }
        _ => serde_json::json!({"error": err.to_string()}),
    };
    (status, Json(body)).into_response()
}
