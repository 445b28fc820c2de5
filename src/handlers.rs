use crate::errors::AppError;
use crate::models::{PhaseId, PhaseRequest, StateResponse, StatsResponse, TaskId, TaskInput};
use crate::state::AppState;
use crate::tracker::Tracker;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use tokio::sync::MutexGuard;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let tracker = current(&state).await;
    Html(render_index(&tracker.snapshot()))
}

pub async fn get_state(State(state): State<AppState>) -> Result<Json<StateResponse>, AppError> {
    let tracker = current(&state).await;
    Ok(Json(tracker.snapshot()))
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let tracker = current(&state).await;
    Ok(Json(tracker.stats()))
}

pub async fn select_phase(
    State(state): State<AppState>,
    Json(payload): Json<PhaseRequest>,
) -> Result<Json<StateResponse>, AppError> {
    let phase: PhaseId = payload
        .phase
        .parse()
        .map_err(|err| AppError::bad_request(format!("{err}")))?;

    apply(&state, move |tracker| tracker.select_phase(phase)).await
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<StateResponse>, AppError> {
    apply(&state, move |tracker| tracker.toggle_task(id)).await
}

pub async fn add_task(
    State(state): State<AppState>,
    Json(payload): Json<TaskInput>,
) -> Result<Json<StateResponse>, AppError> {
    apply(&state, move |tracker| tracker.add_task(&payload)).await
}

pub async fn edit_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(payload): Json<TaskInput>,
) -> Result<Json<StateResponse>, AppError> {
    apply(&state, move |tracker| tracker.edit_task(id, &payload)).await
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<StateResponse>, AppError> {
    apply(&state, move |tracker| tracker.delete_task(id)).await
}

pub async fn end_day(State(state): State<AppState>) -> Result<Json<StateResponse>, AppError> {
    apply(&state, |tracker| tracker.end_day()).await
}

/// Locks the tracker and moves it to today's date before anything reads it.
async fn current(state: &AppState) -> MutexGuard<'_, Tracker> {
    let mut tracker = state.tracker.lock().await;
    tracker.sync_day();
    tracker
}

/// Runs a mutating action on the blocking pool, since saving writes to disk,
/// and returns the snapshot taken under the same lock.
async fn apply<F>(state: &AppState, action: F) -> Result<Json<StateResponse>, AppError>
where
    F: FnOnce(&mut Tracker) -> Result<bool, AppError> + Send + 'static,
{
    let tracker = state.tracker.clone();
    let snapshot = tokio::task::spawn_blocking(move || {
        let mut tracker = tracker.blocking_lock();
        tracker.sync_day();
        action(&mut *tracker)?;
        Ok::<_, AppError>(tracker.snapshot())
    })
    .await
    .map_err(AppError::internal)??;

    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{MemoryStore, StoreAdapter};
    use axum::http::StatusCode;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn app_state(editable: bool) -> (AppState, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_date(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()));
        let adapter = StoreAdapter::new(Arc::new(MemoryStore::new()), "roadmapData");
        let tracker = Tracker::initialize(adapter, clock.clone(), editable);
        (AppState::new(tracker), clock)
    }

    #[tokio::test]
    async fn mutating_handlers_return_the_new_snapshot() {
        let (state, _) = app_state(true);

        let Json(toggled) = toggle_task(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(toggled.hours, 0.5);
        assert_eq!(toggled.completed.get(&1), Some(&true));

        let payload = PhaseRequest {
            phase: "adv_analyst".to_string(),
        };
        let Json(switched) = select_phase(State(state.clone()), Json(payload)).await.unwrap();
        assert_eq!(switched.phase, PhaseId::AdvAnalyst);
        assert_eq!(switched.hours, 0.5);

        let payload = serde_json::from_value(serde_json::json!({ "name": "Kaggle", "hrs": "2" }))
            .unwrap();
        let Json(added) = add_task(State(state.clone()), Json(payload)).await.unwrap();
        assert_eq!(added.tasks.len(), 7);

        let Json(ended) = end_day(State(state.clone())).await.unwrap();
        assert_eq!(ended.streak, 1);
    }

    #[tokio::test]
    async fn unknown_phase_is_a_bad_request() {
        let (state, _) = app_state(false);
        let payload = PhaseRequest {
            phase: "INTERN".to_string(),
        };
        let err = select_phase(State(state), Json(payload)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reads_roll_over_to_the_new_day() {
        let (state, clock) = app_state(false);
        toggle_task(State(state.clone()), Path(2)).await.unwrap();

        clock.advance(Duration::days(1));
        let Json(snapshot) = get_state(State(state)).await.unwrap();
        assert_eq!(snapshot.date, "2024-05-21");
        assert_eq!(snapshot.hours, 0.0);
        assert_eq!(snapshot.stats.last_7_days[5].hours, 0.5);
    }
}
