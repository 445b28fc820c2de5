use crate::models::{
    date_key, month_key, DailyHoursPoint, PieSlice, RoadmapStore, StatsResponse, Task,
    TaskBarPoint, TaskId,
};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// Seven-day average above this many hours per day counts as burnout risk.
pub const BURNOUT_AVERAGE_HOURS: f64 = 5.0;

pub fn build_stats_at(
    today: NaiveDate,
    store: &RoadmapStore,
    tasks: &[Task],
    completed: &BTreeMap<TaskId, bool>,
) -> StatsResponse {
    let done = completed_count(tasks, completed);
    let last_7_days = last_7_days(today, store);
    let average = average_hours(&last_7_days);

    StatsResponse {
        progress: progress(done, tasks.len()),
        completed_count: done,
        task_count: tasks.len(),
        monthly_hours: monthly_hours(today, store),
        seven_day_average: average,
        burnout: average > BURNOUT_AVERAGE_HOURS,
        last_7_days,
        pie: vec![
            PieSlice {
                name: "Completed".to_string(),
                value: done,
            },
            PieSlice {
                name: "Remaining".to_string(),
                value: tasks.len() - done,
            },
        ],
        task_bar: tasks
            .iter()
            .map(|task| TaskBarPoint {
                id: task.id,
                name: task.name.clone(),
                done: u8::from(is_done(completed, task.id)),
            })
            .collect(),
        month_bar: month_to_date(today, store),
    }
}

/// Tasks of the given list marked complete. Ids outside the list are ignored.
pub fn completed_count(tasks: &[Task], completed: &BTreeMap<TaskId, bool>) -> usize {
    tasks
        .iter()
        .filter(|task| is_done(completed, task.id))
        .count()
}

pub fn progress(completed_count: usize, task_count: usize) -> u8 {
    if task_count == 0 {
        return 0;
    }
    let percent = (100.0 * completed_count as f64 / task_count as f64).round();
    percent.clamp(0.0, 100.0) as u8
}

pub fn monthly_hours(today: NaiveDate, store: &RoadmapStore) -> f64 {
    let prefix = month_key(today);
    store
        .days
        .iter()
        .filter(|(key, _)| key.starts_with(&prefix))
        .map(|(_, record)| record.hours)
        .sum()
}

/// The seven calendar days ending with `today`, oldest first.
pub fn last_7_days(today: NaiveDate, store: &RoadmapStore) -> Vec<DailyHoursPoint> {
    (0..7)
        .rev()
        .map(|offset| point(today - Duration::days(offset), store))
        .collect()
}

pub fn average_hours(points: &[DailyHoursPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|point| point.hours).sum::<f64>() / points.len() as f64
}

/// Day 1 of the current month through `today`.
pub fn month_to_date(today: NaiveDate, store: &RoadmapStore) -> Vec<DailyHoursPoint> {
    let first = today - Duration::days(i64::from(today.day0()));
    first
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| point(date, store))
        .collect()
}

fn point(date: NaiveDate, store: &RoadmapStore) -> DailyHoursPoint {
    DailyHoursPoint {
        date: date_key(date),
        label: date.format("%m-%d").to_string(),
        hours: store.hours_on(date),
    }
}

fn is_done(completed: &BTreeMap<TaskId, bool>, id: TaskId) -> bool {
    completed.get(&id).copied().unwrap_or(false)
}
