use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::Utc;
use dotenvy::dotenv;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::{collections::HashMap, env, net::SocketAddr};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use journal_manager_rust::{
    auth::AuthClaims,
    dashboard::DashboardController,
    db::{DbConfig, connect_pool, upsert_user_by_sub},
    review_forms::ReviewFormController,
    security::load_user,
    services::{InMemoryService, JournalContext, JournalError},
    statistics::StatisticsController,
};

#[derive(Clone)]
struct AppState {
    db: PgPool,
    journal: InMemoryService,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let db_config = DbConfig::from_env();
    let db = connect_pool(&db_config).expect("failed to configure postgres pool");

    let journal = InMemoryService::new_with_sample();
    let state = AppState { db, journal };
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/editor/review-forms", get(list_review_forms))
        .route("/api/editor/review-forms", post(create_review_form))
        .route("/api/editor/review-forms/{form_id}", patch(update_review_form))
        .route(
            "/api/editor/review-forms/{form_id}",
            delete(delete_review_form),
        )
        .route("/api/editor/dashboard", get(editor_dashboard))
        .route("/api/manager/statistics", get(manager_statistics))
        .with_state(state);

    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:3000".into())
        .parse()
        .expect("invalid BIND_ADDR, expected host:port");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind HTTP listener");
    info!("API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server crashed");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match sqlx::query_scalar::<_, i32>("select 1")
        .fetch_one(&state.db)
        .await
    {
        Ok(_) => json!({"status": "ok"}),
        Err(err) => {
            error!(error = %err, "database connectivity check failed");
            json!({"status": "error", "message": err.to_string()})
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "db": db_status,
            "timestamp": Utc::now()
        })),
    )
}

/// Build the request context for an authenticated call: sync the external
/// subject into the platform user table, then load the acting user's roles.
async fn request_context(
    state: &AppState,
    claims: &AuthClaims,
    params: &HashMap<String, String>,
) -> Result<JournalContext, Response> {
    if let Err(err) = upsert_user_by_sub(&state.db, &claims.sub).await {
        error!(error = %err, "failed to sync user");
    }
    let user_id: i64 = claims.sub.parse().map_err(|_| {
        reply_error(
            StatusCode::UNAUTHORIZED,
            "token subject is not a platform user id",
        )
    })?;
    let mut ctx = JournalContext::default();
    load_user(&state.journal, &mut ctx, user_id).map_err(journal_error_response)?;
    if let Some(journal_id) = params.get("journalId").and_then(|raw| raw.parse::<i64>().ok()) {
        ctx.request.set("journal", journal_id);
        ctx.journal_id = Some(journal_id);
    }
    Ok(ctx)
}

fn reply_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"ok": false, "message": message}))).into_response()
}

fn journal_error_response(error: JournalError) -> Response {
    let status = match error {
        JournalError::Validation(_) => StatusCode::BAD_REQUEST,
        JournalError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        JournalError::NotFound(_) => StatusCode::NOT_FOUND,
        JournalError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    reply_error(status, &error.to_string())
}

fn apply_form_body(ctx: &mut JournalContext, body: &Value) {
    if let Some(title) = body.get("title") {
        ctx.post_vars.set("title", title);
    }
    if let Some(description) = body.get("description") {
        ctx.post_vars.set("description", description);
    }
    if let Some(is_active) = body.get("isActive") {
        ctx.post_vars.set("is_active", is_active);
    }
    if let Some(questions) = body.get("questions") {
        ctx.post_vars.set("questions", questions);
    }
}

async fn list_review_forms(
    State(state): State<AppState>,
    claims: AuthClaims,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut ctx = match request_context(&state, &claims, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let controller = ReviewFormController::new(state.journal.clone());
    match controller.list(&mut ctx) {
        Ok(forms) => (
            StatusCode::OK,
            Json(json!({"ok": true, "forms": forms})),
        )
            .into_response(),
        Err(error) => journal_error_response(error),
    }
}

async fn create_review_form(
    State(state): State<AppState>,
    claims: AuthClaims,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let mut ctx = match request_context(&state, &claims, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    apply_form_body(&mut ctx, &body);
    let controller = ReviewFormController::new(state.journal.clone());
    match controller.create(&mut ctx) {
        Ok(form) => (
            StatusCode::CREATED,
            Json(json!({"ok": true, "form": form})),
        )
            .into_response(),
        Err(error) => journal_error_response(error),
    }
}

async fn update_review_form(
    State(state): State<AppState>,
    claims: AuthClaims,
    Path(form_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let mut ctx = match request_context(&state, &claims, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    apply_form_body(&mut ctx, &body);
    let controller = ReviewFormController::new(state.journal.clone());
    match controller.update(&mut ctx, form_id) {
        Ok(form) => (
            StatusCode::OK,
            Json(json!({"ok": true, "form": form})),
        )
            .into_response(),
        Err(error) => journal_error_response(error),
    }
}

async fn delete_review_form(
    State(state): State<AppState>,
    claims: AuthClaims,
    Path(form_id): Path<i64>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut ctx = match request_context(&state, &claims, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let controller = ReviewFormController::new(state.journal.clone());
    match controller.delete(&mut ctx, form_id) {
        Ok(()) => (StatusCode::OK, Json(json!({"ok": true}))).into_response(),
        Err(error) => journal_error_response(error),
    }
}

async fn editor_dashboard(
    State(state): State<AppState>,
    claims: AuthClaims,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut ctx = match request_context(&state, &claims, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let controller = DashboardController::new(state.journal.clone());
    match controller.editor_dashboard(&mut ctx) {
        Ok(()) => {
            let stats = ctx.context.get("dashboard_stats").cloned().unwrap_or(Value::Null);
            (StatusCode::OK, Json(json!({"ok": true, "stats": stats}))).into_response()
        }
        Err(error) => journal_error_response(error),
    }
}

async fn manager_statistics(
    State(state): State<AppState>,
    claims: AuthClaims,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let mut ctx = match request_context(&state, &claims, &params).await {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let controller = StatisticsController::new(state.journal.clone());
    match controller.view_statistics(&mut ctx) {
        Ok(()) => {
            let statistics = ctx.context.get("statistics").cloned().unwrap_or(Value::Null);
            (
                StatusCode::OK,
                Json(json!({"ok": true, "statistics": statistics})),
            )
                .into_response()
        }
        Err(error) => journal_error_response(error),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    }
}
