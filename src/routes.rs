use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{self, SecurityConfig};
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{access_guard, session_middleware};
use crate::state::AppState;

/// Full application router. The session layer runs before the access guard,
/// and both also cover the fallback so unknown paths are guarded too.
pub fn app(state: AppState) -> Router {
    let config = config::config();

    let router = Router::new()
        .merge(public_routes())
        .merge(session_routes())
        .merge(user_routes())
        .merge(project_routes())
        .merge(task_routes())
        .merge(team_routes())
        .merge(invoice_routes())
        .merge(message_routes())
        .merge(dashboard_routes())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&config.security))
                .layer(middleware::from_fn(session_middleware))
                .layer(middleware::from_fn(access_guard))
                .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes)),
        );

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/signin", get(public::signin_page).post(public::signin_post))
        .route("/auth/signout", post(public::signout_post))
        .route("/unauthorized", get(public::unauthorized))
}

fn session_routes() -> Router<AppState> {
    use protected::session;

    Router::new()
        .route("/api/auth/session", get(session::session_get))
        .route("/api/auth/session/refresh", post(session::session_refresh))
}

fn user_routes() -> Router<AppState> {
    use elevated::users;

    Router::new()
        .route("/api/users", get(users::users_list).post(users::users_create))
        .route(
            "/api/users/:id",
            get(users::users_get).put(users::users_update).delete(users::users_delete),
        )
        .route("/api/users/:id/toggle-status", post(users::users_toggle_status))
}

fn project_routes() -> Router<AppState> {
    use protected::projects;

    Router::new()
        .route("/api/projects", get(projects::projects_list).post(projects::projects_create))
        .route("/api/projects/options", get(projects::projects_options))
        .route("/api/projects/:id", put(projects::projects_update).delete(projects::projects_delete))
}

fn task_routes() -> Router<AppState> {
    use protected::tasks;

    Router::new()
        .route("/api/tasks", get(tasks::tasks_list).post(tasks::tasks_create))
        .route("/api/tasks/:id", put(tasks::tasks_update).delete(tasks::tasks_delete))
}

fn team_routes() -> Router<AppState> {
    use protected::teams;

    Router::new()
        .route("/api/teams", get(teams::teams_list).post(teams::teams_create))
        .route("/api/teams/member-options", get(teams::teams_member_options))
        .route("/api/teams/:id", put(teams::teams_update).delete(teams::teams_delete))
        .route("/api/teams/:id/members", post(teams::team_member_add))
        .route(
            "/api/teams/:id/members/:member_id",
            put(teams::team_member_update).delete(teams::team_member_remove),
        )
}

fn invoice_routes() -> Router<AppState> {
    use protected::invoices;

    Router::new()
        .route("/api/invoices", get(invoices::invoices_list).post(invoices::invoices_create))
        .route("/api/invoices/:id", put(invoices::invoices_update).delete(invoices::invoices_delete))
}

fn message_routes() -> Router<AppState> {
    use protected::messages;

    Router::new()
        .route("/api/messages", get(messages::messages_list).post(messages::messages_create))
        .route("/api/messages/:id", axum::routing::delete(messages::messages_delete))
        .route("/api/messages/:id/read", put(messages::messages_mark_read))
}

fn dashboard_routes() -> Router<AppState> {
    use protected::dashboard;

    // Bare /dashboard never reaches the handler; the guard redirects it home
    Router::new()
        .route("/dashboard", get(dashboard::dashboard_page))
        .route("/dashboard/*rest", get(dashboard::dashboard_page))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    // Explicit origins so the session cookie may be sent cross-origin
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
