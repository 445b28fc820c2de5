use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::{
    date_key, default_catalog, DayRecord, PhaseId, PhaseOption, RoadmapStore, StateResponse,
    StatsResponse, Task, TaskCatalog, TaskId, TaskInput,
};
use crate::stats::{build_stats_at, completed_count};
use crate::storage::StoreAdapter;
use chrono::NaiveDate;
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info};

/// Hours are kept to micro-hour precision so that adding and removing the
/// same task lands back on the same value.
const HOURS_SCALE: f64 = 1_000_000.0;

fn normalize_hours(hours: f64) -> f64 {
    ((hours * HOURS_SCALE).round() / HOURS_SCALE).max(0.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SelectPhase(PhaseId),
    ToggleTask(TaskId),
    AddTask { id: TaskId, name: String, hrs: f64 },
    EditTask { id: TaskId, name: String, hrs: f64 },
    DeleteTask(TaskId),
    EndDay,
}

impl Action {
    fn edits_tasks(&self) -> bool {
        matches!(
            self,
            Action::AddTask { .. } | Action::EditTask { .. } | Action::DeleteTask(_)
        )
    }
}

/// Everything the page shows for the current day.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    pub today: NaiveDate,
    pub phase: PhaseId,
    pub completed: BTreeMap<TaskId, bool>,
    pub hours: f64,
    pub streak: u64,
    pub tasks_by_phase: TaskCatalog,
}

impl TrackerState {
    pub fn active_tasks(&self) -> &[Task] {
        self.tasks_by_phase
            .get(&self.phase)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn completed_count(&self) -> usize {
        completed_count(self.active_tasks(), &self.completed)
    }

    pub fn is_done(&self, id: TaskId) -> bool {
        self.completed.get(&id).copied().unwrap_or(false)
    }

    /// One user action applied to the state as a single transition.
    ///
    /// Actions that do not apply (unknown id, invalid task fields) return the
    /// state unchanged.
    pub fn apply(mut self, action: Action) -> Self {
        match action {
            Action::SelectPhase(phase) => {
                self.phase = phase;
            }
            Action::ToggleTask(id) => {
                let Some(hrs) = self
                    .active_tasks()
                    .iter()
                    .find(|task| task.id == id)
                    .map(|task| task.hrs)
                else {
                    return self;
                };
                let was_done = self.is_done(id);
                if was_done {
                    self.completed.remove(&id);
                    self.hours = normalize_hours(self.hours - hrs);
                } else {
                    self.completed.insert(id, true);
                    self.hours = normalize_hours(self.hours + hrs);
                }
            }
            Action::AddTask { id, name, hrs } => {
                if !valid_task_fields(&name, hrs) {
                    return self;
                }
                let tasks = self.tasks_by_phase.entry(self.phase).or_default();
                if tasks.iter().any(|task| task.id == id) {
                    return self;
                }
                tasks.push(Task::new(id, name, hrs));
            }
            Action::EditTask { id, name, hrs } => {
                if !valid_task_fields(&name, hrs) {
                    return self;
                }
                if let Some(task) = self
                    .tasks_by_phase
                    .get_mut(&self.phase)
                    .and_then(|tasks| tasks.iter_mut().find(|task| task.id == id))
                {
                    task.name = name;
                    task.hrs = hrs;
                }
            }
            Action::DeleteTask(id) => {
                if let Some(tasks) = self.tasks_by_phase.get_mut(&self.phase) {
                    tasks.retain(|task| task.id != id);
                }
            }
            Action::EndDay => {
                self.streak = if self.completed_count() > 0 {
                    self.streak.saturating_add(1)
                } else {
                    0
                };
            }
        }
        self
    }

    fn next_task_id(&self, now_millis: i64) -> TaskId {
        let largest = self
            .tasks_by_phase
            .values()
            .flatten()
            .map(|task| task.id)
            .max()
            .unwrap_or(0);
        u64::try_from(now_millis)
            .unwrap_or(0)
            .max(largest.saturating_add(1))
    }
}

fn valid_task_fields(name: &str, hrs: f64) -> bool {
    !name.trim().is_empty() && hrs.is_finite() && hrs > 0.0
}

/// Owner of the one authoritative copy of the stored document.
///
/// Every change goes through [`Tracker::dispatch`], which merges the new state
/// into the in-memory document and saves the whole thing. Storage is only read
/// once, at initialization.
pub struct Tracker {
    adapter: StoreAdapter,
    clock: Arc<dyn Clock>,
    document: RoadmapStore,
    state: TrackerState,
    editable: bool,
    ready: bool,
}

impl Tracker {
    pub fn initialize(adapter: StoreAdapter, clock: Arc<dyn Clock>, editable: bool) -> Self {
        let document = adapter.load();
        let today = clock.today();

        let tasks_by_phase = if editable {
            let mut catalog = default_catalog();
            if let Some(stored) = &document.tasks_by_phase {
                catalog.extend(stored.iter().map(|(phase, tasks)| (*phase, tasks.clone())));
            }
            catalog
        } else {
            default_catalog()
        };

        let record = document.day(today).cloned().unwrap_or_default();
        let state = TrackerState {
            today,
            phase: document.phase.unwrap_or_default(),
            completed: record.completed,
            hours: record.hours,
            streak: document.streak.unwrap_or(0),
            tasks_by_phase,
        };

        info!(
            date = %today,
            phase = %state.phase,
            streak = state.streak,
            editable,
            "tracker initialized"
        );

        Self {
            adapter,
            clock,
            document,
            state,
            editable,
            ready: true,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Moves the day-scoped fields to the clock's current date if it changed.
    /// Phase, streak and task lists carry over.
    pub fn sync_day(&mut self) -> bool {
        let today = self.clock.today();
        if today == self.state.today {
            return false;
        }

        info!(from = %self.state.today, to = %today, "day rolled over");
        let record = self.document.day(today).cloned().unwrap_or_default();
        self.state.today = today;
        self.state.completed = record.completed;
        self.state.hours = record.hours;
        true
    }

    /// Applies `action` and saves if the state changed. Returns whether it did.
    ///
    /// State and document are only replaced once the save went through, so a
    /// failed write leaves the tracker as it was.
    pub fn dispatch(&mut self, action: Action) -> Result<bool, AppError> {
        if action.edits_tasks() && !self.editable {
            return Err(AppError::forbidden("task editing is disabled"));
        }

        let next = self.state.clone().apply(action);
        if next == self.state {
            return Ok(false);
        }

        let document = self.merged_document(&next);
        self.adapter.save(&document)?;
        debug!(date = %next.today, hours = next.hours, "saved document");

        self.state = next;
        self.document = document;
        Ok(true)
    }

    pub fn select_phase(&mut self, phase: PhaseId) -> Result<bool, AppError> {
        self.dispatch(Action::SelectPhase(phase))
    }

    pub fn toggle_task(&mut self, id: TaskId) -> Result<bool, AppError> {
        self.dispatch(Action::ToggleTask(id))
    }

    pub fn add_task(&mut self, input: &TaskInput) -> Result<bool, AppError> {
        if !self.editable {
            return Err(AppError::forbidden("task editing is disabled"));
        }
        let Some((name, hrs)) = input.parse() else {
            debug!("ignoring add with empty name or invalid hours");
            return Ok(false);
        };
        let id = self.state.next_task_id(self.clock.now().timestamp_millis());
        self.dispatch(Action::AddTask { id, name, hrs })
    }

    pub fn edit_task(&mut self, id: TaskId, input: &TaskInput) -> Result<bool, AppError> {
        if !self.editable {
            return Err(AppError::forbidden("task editing is disabled"));
        }
        let Some((name, hrs)) = input.parse() else {
            debug!(id, "ignoring edit with empty name or invalid hours");
            return Ok(false);
        };
        self.dispatch(Action::EditTask { id, name, hrs })
    }

    pub fn delete_task(&mut self, id: TaskId) -> Result<bool, AppError> {
        self.dispatch(Action::DeleteTask(id))
    }

    pub fn end_day(&mut self) -> Result<bool, AppError> {
        self.dispatch(Action::EndDay)
    }

    pub fn stats(&self) -> StatsResponse {
        build_stats_at(
            self.state.today,
            &self.document,
            self.state.active_tasks(),
            &self.state.completed,
        )
    }

    pub fn snapshot(&self) -> StateResponse {
        StateResponse {
            date: date_key(self.state.today),
            phase: self.state.phase,
            phase_label: self.state.phase.label().to_string(),
            phases: PhaseId::ALL
                .into_iter()
                .map(|id| PhaseOption {
                    id,
                    label: id.label().to_string(),
                })
                .collect(),
            tasks: self.state.active_tasks().to_vec(),
            completed: self.state.completed.clone(),
            hours: self.state.hours,
            streak: self.state.streak,
            editable: self.editable,
            ready: self.ready,
            stats: self.stats(),
        }
    }

    /// The current document with `state` merged over it.
    fn merged_document(&self, state: &TrackerState) -> RoadmapStore {
        let progress = self.editable.then(|| {
            let total = state.active_tasks().len();
            if total == 0 {
                0.0
            } else {
                state.completed_count() as f64 / total as f64
            }
        });

        let mut document = self.document.clone();
        document.days.insert(
            date_key(state.today),
            DayRecord {
                completed: state.completed.clone(),
                hours: state.hours,
                progress,
            },
        );
        document.phase = Some(state.phase);
        document.streak = Some(state.streak);
        if self.editable {
            document.tasks_by_phase = Some(state.tasks_by_phase.clone());
        }
        document
    }
}
