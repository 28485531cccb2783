//! Mood journal backend: one log per user per calendar day, calendar grids
//! over those logs and period insights.

use std::sync::Arc;

pub mod auth;
pub mod calendar;
pub mod cipher;
pub mod config;
pub mod db;
pub mod error;
pub mod grid;
pub mod handlers;
pub mod models;
pub mod period;
pub mod routes;
pub mod store;

use cipher::NoteCipher;
use config::Config;
use store::LogStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub config: Arc<Config>,
    pub cipher: NoteCipher,
}

impl AppState {
    pub fn new(store: Arc<dyn LogStore>, config: Arc<Config>) -> Self {
        let cipher = NoteCipher::new(config.notes_encryption_key.clone());
        Self {
            store,
            config,
            cipher,
        }
    }
}
