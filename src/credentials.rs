//! Credential pool with random selection
//!
//! Each configured credential gets its own source client. Every fetch
//! picks a client uniformly at random, spreading traffic across the
//! credential set without any per-credential bookkeeping.

use crate::config::{Config, CredentialConfig};
use crate::error::{Error, Result};
use crate::source::{ContentSource, HttpSource};
use rand::Rng;
use std::sync::Arc;

/// Pool of per-credential source clients
#[derive(Clone)]
pub struct CredentialPool {
    sources: Arc<Vec<Arc<dyn ContentSource>>>,
}

impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.sources.len())
            .finish()
    }
}

impl CredentialPool {
    /// Build the pool from configuration, one [`HttpSource`] per credential
    ///
    /// At least one credential is required.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.credentials.is_empty() {
            return Err(Error::Config {
                message: "at least one credential is required".to_string(),
                key: Some("credentials".to_string()),
            });
        }

        let sources = config
            .credentials
            .iter()
            .map(|cred| {
                HttpSource::new(cred.clone(), &config.source)
                    .map(|s| Arc::new(s) as Arc<dyn ContentSource>)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            sources: Arc::new(sources),
        })
    }

    /// Build a pool over pre-constructed sources (used by tests)
    pub fn from_sources(sources: Vec<Arc<dyn ContentSource>>) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::Config {
                message: "at least one credential is required".to_string(),
                key: Some("credentials".to_string()),
            });
        }
        Ok(Self {
            sources: Arc::new(sources),
        })
    }

    /// Pick a source uniformly at random
    pub fn select(&self) -> Arc<dyn ContentSource> {
        if self.sources.len() == 1 {
            return Arc::clone(&self.sources[0]);
        }
        let idx = rand::thread_rng().gen_range(0..self.sources.len());
        Arc::clone(&self.sources[idx])
    }

    /// Number of credentials in the pool
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the pool is empty (never true for a constructed pool)
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Label used in logs and auth errors for a credential
///
/// The user agent doubles as the human-readable identity; secrets never
/// appear in logs.
pub fn credential_label(cred: &CredentialConfig) -> &str {
    &cred.user_agent
}
