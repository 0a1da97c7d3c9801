//! Shared fixtures for harvester tests.

use crate::config::Config;
use crate::credentials::CredentialPool;
use crate::error::FetchError;
use crate::harvester::Harvester;
use crate::source::{ContentSource, FeedPage};
use crate::types::{Post, SortOrder, TimeWindow};
use async_trait::async_trait;
use chrono::DateTime;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded source call, for asserting traversal order
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SourceCall {
    Search {
        query: String,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    },
    UserFeed {
        user: String,
        after: Option<String>,
        limit: u32,
    },
    CommunityFeed {
        community: String,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    },
}

/// Scripted source: responses are consumed FIFO per endpoint
///
/// Once a script runs dry the endpoint returns empty pages, which every
/// strategy treats as exhaustion.
#[derive(Default)]
pub(crate) struct MockSource {
    search_script: Mutex<VecDeque<Result<Vec<Post>, FetchError>>>,
    user_script: Mutex<VecDeque<Result<FeedPage, FetchError>>>,
    community_script: Mutex<VecDeque<Result<Vec<Post>, FetchError>>>,
    calls: Mutex<Vec<SourceCall>>,
}

impl MockSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_search(&self, response: Result<Vec<Post>, FetchError>) {
        self.search_script.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_user(&self, response: Result<FeedPage, FetchError>) {
        self.user_script.lock().unwrap().push_back(response);
    }

    pub(crate) fn push_community(&self, response: Result<Vec<Post>, FetchError>) {
        self.community_script.lock().unwrap().push_back(response);
    }

    pub(crate) fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for MockSource {
    async fn search(
        &self,
        query: &str,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    ) -> Result<Vec<Post>, FetchError> {
        self.calls.lock().unwrap().push(SourceCall::Search {
            query: query.to_string(),
            sort,
            limit,
            window,
        });
        self.search_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn user_feed(
        &self,
        user: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<FeedPage, FetchError> {
        self.calls.lock().unwrap().push(SourceCall::UserFeed {
            user: user.to_string(),
            after: after.map(str::to_string),
            limit,
        });
        self.user_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(FeedPage::default()))
    }

    async fn community_feed(
        &self,
        community: &str,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    ) -> Result<Vec<Post>, FetchError> {
        self.calls.lock().unwrap().push(SourceCall::CommunityFeed {
            community: community.to_string(),
            sort,
            limit,
            window,
        });
        self.community_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(vec![]))
    }
}

/// A harvester wired to a [`MockSource`] over a scratch database
pub(crate) struct TestHarness {
    pub(crate) harvester: Harvester,
    pub(crate) source: Arc<MockSource>,
    // Held so the scratch directory outlives the harness
    _dir: tempfile::TempDir,
}

pub(crate) async fn create_test_harvester() -> TestHarness {
    create_test_harvester_with(|_| {}).await
}

/// Build a harness, letting the caller tweak the config first
pub(crate) async fn create_test_harvester_with(adjust: impl FnOnce(&mut Config)) -> TestHarness {
    let dir = tempfile::tempdir().expect("failed to create temp dir");

    let mut config = Config::default();
    config.persistence.database_path = dir.path().join("test.db");
    config.persistence.export_path = dir.path().join("data.txt");
    // Millisecond pacing so tests finish quickly
    config.harvest.min_delay = Duration::from_millis(1);
    config.harvest.max_delay = Duration::from_millis(2);
    config.harvest.error_backoff = Duration::from_millis(5);
    adjust(&mut config);

    let source = Arc::new(MockSource::new());
    let pool = CredentialPool::from_sources(vec![source.clone() as Arc<dyn ContentSource>])
        .expect("pool from one source");
    let harvester = Harvester::with_credential_pool(config, pool)
        .await
        .expect("failed to build test harvester");

    TestHarness {
        harvester,
        source,
        _dir: dir,
    }
}

/// A post fixture with a deterministic creation time
pub(crate) fn post(id: &str, created_secs: i64) -> Post {
    Post {
        id: id.to_string(),
        author: "tester".to_string(),
        title: format!("Post {id}"),
        score: 10,
        url: format!("https://example.com/{id}"),
        created_at: DateTime::from_timestamp(created_secs, 0).expect("valid timestamp"),
        permalink: format!("/r/testing/comments/{id}/"),
        num_comments: 0,
        selftext: None,
        community: "testing".to_string(),
    }
}

/// `count` posts with ids `{prefix}0..{prefix}count`, newest first
pub(crate) fn posts(prefix: &str, count: usize) -> Vec<Post> {
    (0..count)
        .map(|i| post(&format!("{prefix}{i}"), 1_700_000_000 - i as i64))
        .collect()
}
