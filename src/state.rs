use crate::config::Config;
use crate::daykey::{today_key, DayKey};
use crate::models::AppData;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
    pub utc_offset_hours: i32,
}

impl AppState {
    pub fn new(config: &Config, data: AppData) -> Self {
        Self {
            data_path: config.data_path.clone(),
            data: Arc::new(Mutex::new(data)),
            utc_offset_hours: config.utc_offset_hours,
        }
    }

    pub fn today(&self) -> DayKey {
        today_key(self.utc_offset_hours)
    }
}
