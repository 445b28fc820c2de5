use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/state", get(handlers::get_state))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/phase", post(handlers::select_phase))
        .route("/api/tasks", post(handlers::add_task))
        .route(
            "/api/tasks/:id",
            put(handlers::edit_task).delete(handlers::delete_task),
        )
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route("/api/end-day", post(handlers::end_day))
        .with_state(state)
}
