//! Cached data accessor and initial-data aggregator

use super::revalidate::{resolve_tags, RevalidationOutcome};
use crate::cache::{CachePolicy, CacheStats, CacheTag, Clock, SystemClock, TagLedger, TtlCache};
use crate::config::{validate_config_result, PageFeedConfig};
use crate::cursor::extract_next_cursor;
use crate::graph::{Engagement, GraphApi, GraphClient, PageInfo, Post, PostsPage};
use crate::{metrics, PageFeedError, Result};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default page size for post listings
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size requested from the Graph API
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamp a requested page size into 1..=MAX_PAGE_SIZE
pub fn clamp_page_size(limit: u32) -> u32 {
    limit.clamp(1, MAX_PAGE_SIZE)
}

/// Page id and access token the service is bound to
#[derive(Clone)]
pub struct Credentials {
    pub page_id: String,
    pub access_token: String,
}

impl Credentials {
    pub fn new(page_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            access_token: access_token.into(),
        }
    }

    fn require(&self) -> Result<()> {
        if self.page_id.trim().is_empty() {
            return Err(PageFeedError::Configuration(
                "Missing Facebook configuration: FACEBOOK_PAGE_ID is not set".to_string(),
            ));
        }
        if self.access_token.trim().is_empty() {
            return Err(PageFeedError::Configuration(
                "Missing Facebook configuration: FACEBOOK_ACCESS_TOKEN is not set".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("page_id", &self.page_id)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

/// Per-operation TTLs and feed settings
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub page_info_ttl: Duration,
    pub posts_ttl: Duration,
    pub engagement_ttl: Duration,
    pub initial_page_size: u32,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_info_ttl: Duration::from_secs(3600),
            posts_ttl: Duration::from_secs(300),
            engagement_ttl: Duration::from_secs(600),
            initial_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&PageFeedConfig> for FeedOptions {
    fn from(config: &PageFeedConfig) -> Self {
        Self {
            page_info_ttl: config.cache.page_info_ttl(),
            posts_ttl: config.cache.posts_ttl(),
            engagement_ttl: config.cache.engagement_ttl(),
            initial_page_size: config.feed.initial_page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PageInfoKey {
    page_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PostsKey {
    page_id: String,
    limit: u32,
    after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EngagementKey {
    post_id: String,
}

/// Page info and the first page of posts, fetched together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialData {
    pub page_info: PageInfo,
    pub posts: Vec<Post>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Configuration and counters of one cache
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDescription {
    pub name: &'static str,
    pub ttl_secs: u64,
    pub tags: Vec<CacheTag>,
    pub stats: CacheStats,
}

/// Snapshot of every cache the service owns
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    pub page_id: String,
    pub caches: Vec<CacheDescription>,
    pub available_tags: Vec<CacheTag>,
}

/// Cached access to one page's Graph API data
///
/// Wraps a [`GraphApi`] with one [`TtlCache`] per operation. All caches share
/// a [`TagLedger`], so revalidating `facebook` reaches every entry.
pub struct FeedService {
    graph: Arc<dyn GraphApi>,
    credentials: Credentials,
    ledger: Arc<TagLedger>,
    page_info: TtlCache<PageInfoKey, PageInfo>,
    posts: TtlCache<PostsKey, PostsPage>,
    engagement: TtlCache<EngagementKey, Engagement>,
    initial_page_size: u32,
}

impl FeedService {
    pub fn new(graph: Arc<dyn GraphApi>, credentials: Credentials, options: FeedOptions) -> Self {
        Self::with_clock(graph, credentials, options, Arc::new(SystemClock))
    }

    /// Build with an explicit time source (tests use a manual clock)
    pub fn with_clock(
        graph: Arc<dyn GraphApi>,
        credentials: Credentials,
        options: FeedOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = Arc::new(TagLedger::new());
        Self {
            graph,
            credentials,
            page_info: TtlCache::new(
                "page_info",
                CachePolicy::new(options.page_info_ttl, &[CacheTag::Facebook, CacheTag::PageInfo]),
                ledger.clone(),
                clock.clone(),
            ),
            posts: TtlCache::new(
                "posts",
                CachePolicy::new(options.posts_ttl, &[CacheTag::Facebook, CacheTag::Posts]),
                ledger.clone(),
                clock.clone(),
            ),
            engagement: TtlCache::new(
                "engagement",
                CachePolicy::new(
                    options.engagement_ttl,
                    &[CacheTag::Facebook, CacheTag::Engagement],
                ),
                ledger.clone(),
                clock,
            ),
            ledger,
            initial_page_size: clamp_page_size(options.initial_page_size),
        }
    }

    /// Wire up the HTTP Graph client from configuration
    ///
    /// Missing credentials are not fatal here: each operation reports them as
    /// a configuration error instead.
    pub fn from_config(config: &PageFeedConfig) -> Result<Self> {
        if let Err(e) = validate_config_result(config) {
            tracing::warn!(error = %e, "Starting with incomplete configuration");
        }
        let graph = GraphClient::new(config.facebook.api_base_url.clone())?;
        Ok(Self::new(
            Arc::new(graph),
            Credentials::new(
                config.facebook.page_id.clone(),
                config.facebook.access_token.clone(),
            ),
            FeedOptions::from(config),
        ))
    }

    pub fn page_id(&self) -> &str {
        &self.credentials.page_id
    }

    pub fn initial_page_size(&self) -> u32 {
        self.initial_page_size
    }

    pub fn page_info_ttl(&self) -> Duration {
        self.page_info.policy().ttl
    }

    pub fn posts_ttl(&self) -> Duration {
        self.posts.policy().ttl
    }

    pub fn engagement_ttl(&self) -> Duration {
        self.engagement.policy().ttl
    }

    /// Page profile, cached for the page-info TTL
    pub async fn page_info(&self) -> Result<PageInfo> {
        self.credentials.require()?;
        let key = PageInfoKey {
            page_id: self.credentials.page_id.clone(),
        };
        self.page_info
            .get_or_try_insert_with(key, || {
                upstream(
                    "page_info",
                    self.graph
                        .fetch_page_info(&self.credentials.page_id, &self.credentials.access_token),
                )
            })
            .await
    }

    /// One page of posts, cached per (limit, cursor) for the posts TTL
    ///
    /// `limit` is clamped into 1..=[`MAX_PAGE_SIZE`].
    pub async fn posts(&self, limit: u32, after: Option<&str>) -> Result<PostsPage> {
        self.credentials.require()?;
        let limit = clamp_page_size(limit);
        let key = PostsKey {
            page_id: self.credentials.page_id.clone(),
            limit,
            after: after.map(str::to_string),
        };
        self.posts
            .get_or_try_insert_with(key, || {
                upstream(
                    "posts",
                    self.graph.fetch_posts(
                        &self.credentials.page_id,
                        &self.credentials.access_token,
                        limit,
                        after,
                    ),
                )
            })
            .await
    }

    /// Engagement counts of one post, cached for the engagement TTL
    pub async fn post_engagement(&self, post_id: &str) -> Result<Engagement> {
        self.credentials.require()?;
        if post_id.trim().is_empty() {
            return Err(PageFeedError::Configuration("Missing post id".to_string()));
        }
        let key = EngagementKey {
            post_id: post_id.to_string(),
        };
        self.engagement
            .get_or_try_insert_with(key, || {
                upstream(
                    "engagement",
                    self.graph
                        .fetch_post_engagement(post_id, &self.credentials.access_token),
                )
            })
            .await
    }

    /// Page info and the first page of posts, fetched concurrently
    ///
    /// Both fetches run to completion so a success on one side is cached even
    /// when the other fails. No partial result is returned; when both fail the
    /// page-info error wins.
    pub async fn initial_data(&self) -> Result<InitialData> {
        self.initial_data_with(self.initial_page_size).await
    }

    /// [`initial_data`](Self::initial_data) with an explicit first-page size
    pub async fn initial_data_with(&self, page_size: u32) -> Result<InitialData> {
        let (page_info, posts) = tokio::join!(self.page_info(), self.posts(page_size, None));
        let page_info = page_info?;
        let posts = posts?;

        let next_cursor = extract_next_cursor(posts.next_url.as_deref());
        Ok(InitialData {
            page_info,
            has_more: next_cursor.is_some(),
            next_cursor,
            posts: posts.posts,
        })
    }

    /// Invalidate the given cache tags on every cache
    pub async fn invalidate(&self, tags: &[CacheTag]) {
        self.ledger.invalidate(tags).await;
        for tag in tags {
            metrics::record_revalidation(tag.as_str());
        }
        tracing::info!(tags = ?tags, "Cache tags invalidated");
    }

    /// Resolve logical names (`posts`, `page-info`, `engagement`, `all`) and invalidate them
    pub async fn revalidate<S: AsRef<str>>(&self, names: &[S]) -> RevalidationOutcome {
        let tags = resolve_tags(names);
        if !tags.is_empty() {
            self.invalidate(&tags).await;
        }
        RevalidationOutcome {
            revalidated_tags: tags,
            timestamp: chrono::Utc::now(),
        }
    }

    /// TTLs, tags and counters of every cache
    pub async fn cache_info(&self) -> CacheInfo {
        let caches = vec![
            describe(self.page_info.name(), self.page_info.policy(), self.page_info.stats().await),
            describe(self.posts.name(), self.posts.policy(), self.posts.stats().await),
            describe(self.engagement.name(), self.engagement.policy(), self.engagement.stats().await),
        ];
        CacheInfo {
            page_id: self.credentials.page_id.clone(),
            caches,
            available_tags: CacheTag::ALL.to_vec(),
        }
    }
}

fn describe(name: &'static str, policy: &CachePolicy, stats: CacheStats) -> CacheDescription {
    CacheDescription {
        name,
        ttl_secs: policy.ttl.as_secs(),
        tags: policy.tags.clone(),
        stats,
    }
}

/// Time and account for one Graph API read
async fn upstream<T, F>(operation: &'static str, fetch: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let result = fetch.await;
    let elapsed = started.elapsed();
    metrics::record_upstream_duration(operation, elapsed.as_secs_f64());

    match &result {
        Ok(_) => tracing::debug!(
            operation,
            elapsed_ms = elapsed.as_millis() as u64,
            "Graph API read complete"
        ),
        Err(e) => {
            metrics::record_upstream_error(operation, e.kind());
            tracing::error!(operation, kind = e.kind(), error = %e, "Graph API read failed");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::feed::testing::{expired_token, sample_page_info, FakeGraph};
    use crate::error::AuthFailure;

    fn service(graph: FakeGraph) -> (FeedService, Arc<FakeGraph>, Arc<ManualClock>) {
        let graph = Arc::new(graph);
        let clock = Arc::new(ManualClock::new());
        let service = FeedService::with_clock(
            graph.clone(),
            Credentials::new("396720486865677", "token"),
            FeedOptions::default(),
            clock.clone(),
        );
        (service, graph, clock)
    }

    #[tokio::test]
    async fn test_posts_twice_is_one_upstream_call() {
        let (service, graph, _clock) = service(FakeGraph::new());

        let first = service.posts(10, None).await.unwrap();
        let second = service.posts(10, None).await.unwrap();

        assert_eq!(graph.posts_calls(), 1);
        assert_eq!(first, second);
        assert_eq!(first.next_cursor.as_deref(), Some("c1"));
        assert_eq!(first.next_cursor, second.next_cursor);
    }

    #[tokio::test]
    async fn test_distinct_parameters_are_distinct_entries() {
        let (service, graph, _clock) = service(FakeGraph::new());

        service.posts(10, None).await.unwrap();
        service.posts(20, None).await.unwrap();
        service.posts(10, Some("c1")).await.unwrap();
        service.posts(10, Some("c1")).await.unwrap();

        assert_eq!(graph.posts_calls(), 3);
        let requests = graph.posts_requests.lock().unwrap();
        assert_eq!(requests[2], (10, Some("c1".to_string())));
    }

    #[tokio::test]
    async fn test_per_operation_ttls() {
        let (service, graph, clock) = service(FakeGraph::new());

        service.page_info().await.unwrap();
        service.posts(10, None).await.unwrap();
        service.post_engagement("1_2").await.unwrap();

        clock.advance(Duration::from_secs(300));
        service.page_info().await.unwrap();
        service.posts(10, None).await.unwrap();
        service.post_engagement("1_2").await.unwrap();
        assert_eq!(graph.page_info_calls(), 1);
        assert_eq!(graph.posts_calls(), 2);
        assert_eq!(graph.engagement_calls(), 1);

        clock.advance(Duration::from_secs(300));
        let engagement = service.post_engagement("1_2").await.unwrap();
        assert_eq!(graph.engagement_calls(), 2);
        assert_eq!(engagement.reaction_count, 26);

        clock.advance(Duration::from_secs(3000));
        service.page_info().await.unwrap();
        assert_eq!(graph.page_info_calls(), 2);
    }

    #[tokio::test]
    async fn test_revalidate_posts_forces_one_refetch() {
        let (service, graph, _clock) = service(FakeGraph::new());

        service.posts(10, None).await.unwrap();
        service.page_info().await.unwrap();

        let outcome = service.revalidate(&["posts"]).await;
        assert_eq!(outcome.revalidated_tags, vec![CacheTag::Facebook, CacheTag::Posts]);

        service.posts(10, None).await.unwrap();
        service.posts(10, None).await.unwrap();
        assert_eq!(graph.posts_calls(), 2);

        // page info carries the umbrella tag too
        service.page_info().await.unwrap();
        assert_eq!(graph.page_info_calls(), 2);
    }

    #[tokio::test]
    async fn test_revalidate_engagement_leaves_posts_cached() {
        let (service, graph, _clock) = service(FakeGraph::new());

        service.posts(10, None).await.unwrap();
        service.post_engagement("1_2").await.unwrap();

        service.invalidate(&[CacheTag::Engagement]).await;
        service.posts(10, None).await.unwrap();
        service.post_engagement("1_2").await.unwrap();

        assert_eq!(graph.posts_calls(), 1);
        assert_eq!(graph.engagement_calls(), 2);
    }

    #[tokio::test]
    async fn test_revalidate_all_reaches_every_operation() {
        let (service, graph, _clock) = service(FakeGraph::new());

        service.page_info().await.unwrap();
        service.posts(10, None).await.unwrap();
        service.post_engagement("1_2").await.unwrap();

        let outcome = service.revalidate(&["all"]).await;
        assert_eq!(outcome.revalidated_tags, vec![CacheTag::Facebook]);

        service.page_info().await.unwrap();
        service.posts(10, None).await.unwrap();
        service.post_engagement("1_2").await.unwrap();
        assert_eq!(graph.page_info_calls(), 2);
        assert_eq!(graph.posts_calls(), 2);
        assert_eq!(graph.engagement_calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_revalidation_tags_invalidate_nothing() {
        let (service, graph, _clock) = service(FakeGraph::new());
        service.posts(10, None).await.unwrap();

        let outcome = service.revalidate(&["comments"]).await;
        assert!(outcome.revalidated_tags.is_empty());

        service.posts(10, None).await.unwrap();
        assert_eq!(graph.posts_calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_retried_not_cached() {
        let (service, graph, _clock) = service(FakeGraph::new().failing_page_info(expired_token));

        assert!(service.page_info().await.is_err());
        assert!(service.page_info().await.is_err());
        assert_eq!(graph.page_info_calls(), 2);
    }

    #[tokio::test]
    async fn test_initial_data_merges_both_fetches() {
        let (service, graph, _clock) = service(FakeGraph::new());

        let data = service.initial_data().await.unwrap();
        assert_eq!(data.page_info, sample_page_info());
        assert_eq!(data.posts.len(), 3);
        assert_eq!(data.next_cursor.as_deref(), Some("c1"));
        assert!(data.has_more);

        let requests = graph.posts_requests.lock().unwrap();
        assert_eq!(requests[0], (DEFAULT_PAGE_SIZE, None));
    }

    #[tokio::test]
    async fn test_initial_data_fails_when_posts_token_expired() {
        let (service, graph, _clock) =
            service(FakeGraph::new().failing_posts(|_| Some(expired_token())));

        let err = service.initial_data().await.unwrap_err();
        assert!(matches!(err, PageFeedError::UpstreamAuth(AuthFailure::Expired)));
        assert!(err.to_string().contains("Access Token Expired"));

        // The successful page-info half is still cached
        service.page_info().await.unwrap();
        assert_eq!(graph.page_info_calls(), 1);
    }

    #[tokio::test]
    async fn test_initial_data_prefers_page_info_error() {
        let (service, _graph, _clock) = service(
            FakeGraph::new()
                .failing_page_info(|| PageFeedError::WrongTokenType)
                .failing_posts(|_| Some(expired_token())),
        );

        let err = service.initial_data().await.unwrap_err();
        assert!(matches!(err, PageFeedError::WrongTokenType));
    }

    #[tokio::test]
    async fn test_missing_credentials_never_reach_upstream() {
        let graph = Arc::new(FakeGraph::new());
        let service = FeedService::new(
            graph.clone(),
            Credentials::new("", "token"),
            FeedOptions::default(),
        );

        assert!(matches!(
            service.page_info().await,
            Err(PageFeedError::Configuration(_))
        ));
        assert!(matches!(
            service.initial_data().await,
            Err(PageFeedError::Configuration(_))
        ));
        assert_eq!(graph.page_info_calls(), 0);
        assert_eq!(graph.posts_calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_info_reports_ttls_and_counters() {
        let (service, _graph, _clock) = service(FakeGraph::new());
        service.posts(10, None).await.unwrap();
        service.posts(10, None).await.unwrap();

        let info = service.cache_info().await;
        assert_eq!(info.page_id, "396720486865677");
        assert_eq!(info.available_tags.len(), 4);

        let posts = info.caches.iter().find(|c| c.name == "posts").unwrap();
        assert_eq!(posts.ttl_secs, 300);
        assert_eq!(posts.tags, vec![CacheTag::Facebook, CacheTag::Posts]);
        assert_eq!((posts.stats.hits, posts.stats.misses, posts.stats.entries), (1, 1, 1));

        let page_info = info.caches.iter().find(|c| c.name == "page_info").unwrap();
        assert_eq!(page_info.ttl_secs, 3600);
    }

    #[tokio::test]
    async fn test_posts_clamps_limit_before_caching() {
        let (service, graph, _clock) = service(FakeGraph::new());

        service.posts(0, None).await.unwrap();
        service.posts(1, None).await.unwrap();
        service.posts(500, None).await.unwrap();
        service.posts(100, None).await.unwrap();

        assert_eq!(graph.posts_calls(), 2);
        let requests = graph.posts_requests.lock().unwrap();
        assert_eq!(requests[0], (1, None));
        assert_eq!(requests[1], (MAX_PAGE_SIZE, None));
    }

    #[tokio::test]
    async fn test_initial_data_with_explicit_page_size() {
        let (service, graph, _clock) = service(FakeGraph::new());

        let data = service.initial_data_with(3).await.unwrap();
        assert_eq!(data.posts.len(), 3);

        let requests = graph.posts_requests.lock().unwrap();
        assert_eq!(requests[0], (3, None));
    }

    #[test]
    fn test_clamp_page_size() {
        assert_eq!(clamp_page_size(0), 1);
        assert_eq!(clamp_page_size(10), 10);
        assert_eq!(clamp_page_size(500), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let debug = format!("{:?}", Credentials::new("1", "EAAB-secret"));
        assert!(!debug.contains("EAAB-secret"));
    }
}
