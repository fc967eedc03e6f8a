//! Cached page feed
//!
//! [`FeedService`] is the data layer the HTTP routes and CLI read through:
//!
//! - page info, post pages and post engagement, each cached with its own TTL
//! - the initial-data aggregate (page info plus first page, fetched together)
//! - tag-based revalidation of the caches
//!
//! [`FeedSession`] drives incremental "load more" on top of the service.

mod revalidate;
mod service;
mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use revalidate::{
    resolve_tags, secret_matches, RevalidationOutcome, RevalidationTarget, LOGICAL_TAGS,
};
pub use service::{
    clamp_page_size, CacheDescription, CacheInfo, Credentials, FeedOptions, FeedService,
    InitialData, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use session::{FeedSession, FeedState};
