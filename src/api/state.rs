//! Shared state for API handlers

use crate::config::Config;
use crate::harvester::Harvester;
use std::sync::Arc;

/// Application state shared across all API routes
#[derive(Clone)]
pub struct AppState {
    /// The harvester instance handling all operations
    pub harvester: Arc<Harvester>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(harvester: Arc<Harvester>, config: Arc<Config>) -> Self {
        Self { harvester, config }
    }
}
