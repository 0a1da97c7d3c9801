//! Append-only human-readable export log
//!
//! Every accepted item is appended to a single text file as one
//! fixed-format block. Appends are serialized through an async mutex so
//! blocks from concurrent tasks never interleave.

use crate::error::Result;
use crate::types::{Post, TaskKind};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const SEPARATOR: &str = "==================================================";

/// Shared export log handle
pub struct ExportLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ExportLog {
    /// Create a log that appends to `path`
    ///
    /// The file is created lazily on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one accepted item as a formatted block
    pub async fn append(
        &self,
        query: &str,
        kind: TaskKind,
        post: &Post,
        scraped_at: DateTime<Utc>,
    ) -> Result<()> {
        let block = format_block(query, kind, post, scraped_at);

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}

fn format_block(query: &str, kind: TaskKind, post: &Post, scraped_at: DateTime<Utc>) -> String {
    let mut block = String::with_capacity(256);
    block.push_str(&format!("\n{SEPARATOR}\n"));
    block.push_str(&format!("Task: {query} ({kind})\n"));
    block.push_str(&format!("Created Time: {}\n", post.created_at));
    block.push_str(&format!("Title: {}\n", post.title));
    block.push_str(&format!("Author: {}\n", post.author));
    block.push_str(&format!("Score: {}\n", post.score));
    block.push_str(&format!("Comments: {}\n", post.num_comments));
    block.push_str(&format!("URL: {}\n", post.url));
    block.push_str(&format!("Community: {}\n", post.community));
    if let Some(body) = &post.selftext {
        block.push_str(&format!("Content:\n{body}\n"));
    }
    block.push_str(&format!("Scraped: {scraped_at}\n"));
    block
}
