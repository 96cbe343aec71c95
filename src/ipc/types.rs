use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::store::SqliteStore;
use crate::sync::UpdateBus;
use crate::table::TableSession;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub store: Option<SqliteStore>,
    pub bus: UpdateBus,
    /// One table session per registered view; created lazily on first
    /// table operation.
    pub tables: HashMap<String, TableSession>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            workspace: None,
            store: None,
            bus: UpdateBus::new(),
            tables: HashMap::new(),
        }
    }
}
