// Intervo API server
// Decision: collaborators are constructed once at startup and shared;
// the engine itself carries deterministic fallbacks for every
// collaborator failure, so the server has no retry policy of its own.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use intervo_api::interviews;
use intervo_core::{
    challenge, events, eval, report, scoring, session, SessionStore, StageMachine,
};
use intervo_judge0::Judge0Client;
use intervo_ollama::OllamaClient;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    model: String,
    sessions: usize,
}

/// State for the health endpoint
#[derive(Clone)]
struct HealthState {
    model: String,
    store: Arc<SessionStore>,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model: state.model.clone(),
        sessions: state.store.len(),
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        interviews::create_interview,
        interviews::post_message,
        interviews::post_code,
        interviews::get_interview,
        interviews::get_report,
        interviews::delete_interview,
    ),
    components(
        schemas(
            session::Session, session::Stage, session::Speaker, session::TurnKind,
            session::Turn, session::Language, session::CodeSubmission,
            challenge::CodingChallenge, challenge::ChallengeExample, challenge::TestCase,
            eval::ExecutionReport, eval::TestCaseResult,
            events::InterviewerEvent, events::ReportEvent, events::AdvanceOutput,
            report::Report, report::ReportDuration, report::ConversationHighlight,
            scoring::Scores, scoring::Recommendation,
            interviews::CreateInterviewRequest, interviews::CreateInterviewResponse,
            interviews::PostMessageRequest, interviews::PostCodeRequest,
        )
    ),
    tags(
        (name = "interviews", description = "Interview session endpoints")
    ),
    info(
        title = "Intervo API",
        version = "0.2.0",
        description = "API for running structured technical interview sessions",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intervo_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("intervo-api starting...");

    let generator = OllamaClient::from_env().context("Failed to build Ollama client")?;
    tracing::info!(model = %generator.model(), "generation collaborator configured");
    let model = generator.model().to_string();

    let sandbox = Judge0Client::from_env().context("Failed to build Judge0 client")?;
    tracing::info!("sandbox collaborator configured");

    let store = Arc::new(SessionStore::new());
    let machine = Arc::new(StageMachine::new(
        store.clone(),
        Arc::new(generator),
        Arc::new(sandbox),
    ));

    let interviews_state = interviews::AppState::new(machine);
    let health_state = HealthState {
        model,
        store: store.clone(),
    };

    // Optional URL prefix, e.g. API_PREFIX="/api" -> /api/v1/interviews
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Only needed when the UI is served from a different origin
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let api_routes = interviews::routes(interviews_state);

    let mut app = Router::new().route("/health", get(health).with_state(health_state));
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]),
        )
    } else {
        app
    };

    let app = app.layer(TraceLayer::new_for_http());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:9000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/v1/test", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}
