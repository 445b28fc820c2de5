use crate::clock::DayBoundary;
use std::{collections::HashMap, env, path::PathBuf};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_STORAGE_KEY: &str = "roadmapData";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub editable_tasks: bool,
    pub day_boundary: DayBoundary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            editable_tasks: false,
            day_boundary: DayBoundary::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Self {
        let mut config = Config::default();
        let var = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = var("PORT") {
            match value.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(err) => warn!("ignoring PORT={value}: {err}"),
            }
        }
        if let Some(value) = var("APP_DATA_DIR") {
            config.data_dir = PathBuf::from(value);
        }
        if let Some(value) = var("APP_STORAGE_KEY") {
            config.storage_key = value.to_string();
        }
        if let Some(value) = var("APP_EDITABLE_TASKS") {
            match parse_flag(value) {
                Some(flag) => config.editable_tasks = flag,
                None => warn!("ignoring APP_EDITABLE_TASKS={value}: expected a boolean"),
            }
        }
        if let Some(value) = var("APP_DAY_BOUNDARY") {
            match value.parse::<DayBoundary>() {
                Ok(boundary) => config.day_boundary = boundary,
                Err(err) => warn!("ignoring APP_DAY_BOUNDARY: {err}"),
            }
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
