use serde::Deserialize;

use crate::store::Store;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub store: Store,
    /// Id of the logged-in user.
    pub session: Option<String>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            session: None,
        }
    }
}
