//! Content platform access
//!
//! Everything above this module sees the platform only through the
//! [`ContentSource`] trait: three read-only listing capabilities, each
//! returning fully-decoded [`Post`](crate::types::Post) values. The
//! HTTP implementation lives in [`http`].

pub mod http;

use crate::error::FetchError;
use crate::types::{Post, SortOrder, TimeWindow};
use async_trait::async_trait;

pub use http::HttpSource;

/// One page of a user's submission feed
///
/// The feed is reverse-chronological and potentially very long; callers
/// page through it by passing the returned cursor back in.
#[derive(Clone, Debug, Default)]
pub struct FeedPage {
    /// The posts on this page, newest first
    pub posts: Vec<Post>,
    /// Opaque cursor for the next page; `None` means the feed is exhausted
    pub after: Option<String>,
}

/// Read-only capability surface of the content platform
///
/// All three operations are fallible with [`FetchError`]; retry policy
/// belongs to the caller, not the source.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Search the whole platform for posts matching `query`
    ///
    /// Results come back in the requested sort order; `window` applies
    /// to score-based sorts.
    async fn search(
        &self,
        query: &str,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    ) -> Result<Vec<Post>, FetchError>;

    /// One page of `user`'s submissions, newest first
    async fn user_feed(
        &self,
        user: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<FeedPage, FetchError>;

    /// A community listing under the given sort
    ///
    /// `window` is only meaningful for [`SortOrder::Top`].
    async fn community_feed(
        &self,
        community: &str,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    ) -> Result<Vec<Post>, FetchError>;
}
