//! Client-side feed state with incremental "load more"
//!
//! `Loading -> Ready | Error` for the first page, then
//! `Ready -> LoadingMore -> Ready` for each further page. A failed load-more
//! keeps every post and the cursor, and surfaces the message as a banner.

use super::service::FeedService;
use crate::graph::{PageInfo, Post};
use crate::Result;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Loading,
    Ready,
    Error(String),
    LoadingMore,
}

/// Posts loaded so far and the cursor for the next page
#[derive(Debug)]
pub struct FeedSession {
    state: FeedState,
    page_info: Option<PageInfo>,
    posts: Vec<Post>,
    next_cursor: Option<String>,
    banner: Option<String>,
    page_size: u32,
}

impl FeedSession {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: FeedState::Idle,
            page_info: None,
            posts: Vec::new(),
            next_cursor: None,
            banner: None,
            page_size,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn page_info(&self) -> Option<&PageInfo> {
        self.page_info.as_ref()
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Error from the most recent failed load-more
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Load page info and the first page, replacing anything loaded before
    pub async fn load_initial(&mut self, service: &FeedService) -> Result<()> {
        self.state = FeedState::Loading;
        self.banner = None;

        match service.initial_data_with(self.page_size).await {
            Ok(data) => {
                self.page_info = Some(data.page_info);
                self.posts = data.posts;
                self.next_cursor = data.next_cursor;
                self.state = FeedState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = FeedState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Load only the first page of posts, leaving page info unset
    pub async fn load_posts(&mut self, service: &FeedService) -> Result<()> {
        self.state = FeedState::Loading;
        self.banner = None;

        match service.posts(self.page_size, None).await {
            Ok(page) => {
                self.posts = page.posts;
                self.next_cursor = page.next_cursor;
                self.state = FeedState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = FeedState::Error(e.to_string());
                Err(e)
            }
        }
    }

    /// Append the next page; returns how many posts were added
    ///
    /// Does nothing unless the session is ready and holds a cursor.
    pub async fn load_more(&mut self, service: &FeedService) -> Result<usize> {
        if self.state != FeedState::Ready {
            return Ok(0);
        }
        let Some(cursor) = self.next_cursor.clone() else {
            return Ok(0);
        };

        self.state = FeedState::LoadingMore;
        let result = service.posts(self.page_size, Some(&cursor)).await;
        self.state = FeedState::Ready;

        match result {
            Ok(page) => {
                let added = page.posts.len();
                self.posts.extend(page.posts);
                self.next_cursor = page.next_cursor;
                self.banner = None;
                tracing::debug!(added, has_more = self.has_more(), "Loaded more posts");
                Ok(added)
            }
            Err(e) => {
                tracing::warn!(error = %e, cursor = %cursor, "Load more failed, keeping loaded posts");
                self.banner = Some(e.to_string());
                Err(e)
            }
        }
    }
}
