use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub type TaskId = u64;

/// Per-phase ordered task lists.
pub type TaskCatalog = BTreeMap<PhaseId, Vec<Task>>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseId {
    #[default]
    Analyst,
    AdvAnalyst,
    DataScientist,
}

impl PhaseId {
    pub const ALL: [PhaseId; 3] = [PhaseId::Analyst, PhaseId::AdvAnalyst, PhaseId::DataScientist];

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseId::Analyst => "ANALYST",
            PhaseId::AdvAnalyst => "ADV_ANALYST",
            PhaseId::DataScientist => "DATA_SCIENTIST",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PhaseId::Analyst => "Analyst Foundation",
            PhaseId::AdvAnalyst => "Advanced Analyst",
            PhaseId::DataScientist => "Data Scientist",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown phase '{}'", self.0)
    }
}

impl std::error::Error for UnknownPhase {}

impl FromStr for PhaseId {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        PhaseId::ALL
            .into_iter()
            .find(|phase| phase.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub hrs: f64,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>, hrs: f64) -> Self {
        Self {
            id,
            name: name.into(),
            hrs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub completed: BTreeMap<TaskId, bool>,
    #[serde(default, deserialize_with = "lenient_hours")]
    pub hours: f64,
    /// Completion ratio (0..1) at the time of the last save. Written, never read back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

fn lenient_hours<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|h| h.is_finite() && *h >= 0.0).unwrap_or(0.0))
}

const PHASE_KEY: &str = "phase";
const STREAK_KEY: &str = "streak";
const TASKS_KEY: &str = "tasksByPhase";

/// The whole persisted document.
///
/// On the wire it is a single JSON object: `phase`, `streak` and `tasksByPhase`
/// at the top level next to one entry per `YYYY-MM-DD` date. Every field decodes
/// on its own, so a damaged field falls back to its default instead of taking
/// the rest of the document with it. Keys this type does not understand are
/// kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoadmapStore {
    pub phase: Option<PhaseId>,
    pub streak: Option<u64>,
    pub tasks_by_phase: Option<TaskCatalog>,
    pub days: BTreeMap<String, DayRecord>,
    pub extra: Map<String, Value>,
}

impl RoadmapStore {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(object) = value else {
            return Self::default();
        };

        let mut store = Self::default();
        for (key, value) in object {
            match key.as_str() {
                PHASE_KEY => match serde_json::from_value(value.clone()) {
                    Ok(phase) => store.phase = Some(phase),
                    Err(_) => {
                        store.extra.insert(key, value);
                    }
                },
                STREAK_KEY => match serde_json::from_value(value.clone()) {
                    Ok(streak) => store.streak = Some(streak),
                    Err(_) => {
                        store.extra.insert(key, value);
                    }
                },
                TASKS_KEY => match serde_json::from_value(value.clone()) {
                    Ok(tasks) => store.tasks_by_phase = Some(tasks),
                    Err(_) => {
                        store.extra.insert(key, value);
                    }
                },
                _ if is_date_key(&key) => match serde_json::from_value(value.clone()) {
                    Ok(record) => {
                        store.days.insert(key, record);
                    }
                    Err(_) => {
                        store.extra.insert(key, value);
                    }
                },
                _ => {
                    store.extra.insert(key, value);
                }
            }
        }
        store
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        if let Some(phase) = self.phase {
            object.insert(PHASE_KEY.to_string(), Value::from(phase.as_str()));
        }
        if let Some(streak) = self.streak {
            object.insert(STREAK_KEY.to_string(), Value::from(streak));
        }
        if let Some(tasks) = &self.tasks_by_phase {
            if let Ok(value) = serde_json::to_value(tasks) {
                object.insert(TASKS_KEY.to_string(), value);
            }
        }
        for (date, record) in &self.days {
            if let Ok(value) = serde_json::to_value(record) {
                object.insert(date.clone(), value);
            }
        }
        Value::Object(object)
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date_key(date))
    }

    pub fn hours_on(&self, date: NaiveDate) -> f64 {
        self.day(date).map(|record| record.hours).unwrap_or(0.0)
    }
}

impl Serialize for RoadmapStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RoadmapStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn is_date_key(key: &str) -> bool {
    key.len() == 10 && NaiveDate::parse_from_str(key, "%Y-%m-%d").is_ok()
}

pub fn default_catalog() -> TaskCatalog {
    let mut catalog = TaskCatalog::new();
    catalog.insert(
        PhaseId::Analyst,
        vec![
            Task::new(1, "Python (Pandas / NumPy)", 0.5),
            Task::new(2, "SQL (Core Queries)", 0.5),
            Task::new(3, "Statistics Basics", 0.3),
            Task::new(4, "Data Visualization / BI", 0.3),
            Task::new(5, "Mini Analysis Project", 0.5),
            Task::new(6, "DSA (Arrays / Strings)", 0.3),
        ],
    );
    catalog.insert(
        PhaseId::AdvAnalyst,
        vec![
            Task::new(1, "Advanced SQL / Windows", 0.7),
            Task::new(2, "Feature Engineering", 0.6),
            Task::new(3, "Business Case Analysis", 0.6),
            Task::new(4, "Dashboard Project", 0.8),
            Task::new(5, "Python Optimization", 0.5),
            Task::new(6, "DSA (Hashing / Two Pointer)", 0.3),
        ],
    );
    catalog.insert(
        PhaseId::DataScientist,
        vec![
            Task::new(1, "Machine Learning Models", 1.0),
            Task::new(2, "Model Evaluation", 0.7),
            Task::new(3, "End-to-End ML Project", 1.5),
            Task::new(4, "Deployment (Streamlit/Flask)", 0.8),
            Task::new(5, "Research / Reading", 0.5),
            Task::new(6, "DSA (Interview Revision)", 0.3),
        ],
    );
    catalog
}

#[derive(Debug, Deserialize)]
pub struct PhaseRequest {
    pub phase: String,
}

/// Body of add/edit requests. `hrs` comes from a free-text field, so both
/// numbers and numeric strings are accepted.
#[derive(Debug, Default, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub hrs: Option<Value>,
}

impl TaskInput {
    /// Returns the trimmed name and hours, or `None` when either is unusable.
    pub fn parse(&self) -> Option<(String, f64)> {
        let name = self.name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        let hrs = match self.hrs.as_ref()? {
            Value::Number(number) => number.as_f64()?,
            Value::String(text) => text.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if !hrs.is_finite() || hrs <= 0.0 {
            return None;
        }
        Some((name.to_string(), hrs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseOption {
    pub id: PhaseId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyHoursPoint {
    pub date: String,
    pub label: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieSlice {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskBarPoint {
    pub id: TaskId,
    pub name: String,
    pub done: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub progress: u8,
    pub completed_count: usize,
    pub task_count: usize,
    pub monthly_hours: f64,
    pub last_7_days: Vec<DailyHoursPoint>,
    pub seven_day_average: f64,
    pub burnout: bool,
    pub pie: Vec<PieSlice>,
    pub task_bar: Vec<TaskBarPoint>,
    pub month_bar: Vec<DailyHoursPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResponse {
    pub date: String,
    pub phase: PhaseId,
    pub phase_label: String,
    pub phases: Vec<PhaseOption>,
    pub tasks: Vec<Task>,
    pub completed: BTreeMap<TaskId, bool>,
    pub hours: f64,
    pub streak: u64,
    pub editable: bool,
    pub ready: bool,
    pub stats: StatsResponse,
}
