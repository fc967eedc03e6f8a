//! Cache tags and the invalidation ledger
//!
//! Every entry is written with the ledger generation observed when its fetch
//! started. Invalidating a tag stamps it with a newer generation, so any entry
//! carrying that tag and written before the stamp reads as stale.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tokio::sync::Mutex;

/// Label attached to cache entries for batch invalidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheTag {
    /// Umbrella tag carried by every entry
    Facebook,
    PageInfo,
    Posts,
    Engagement,
}

impl CacheTag {
    pub const ALL: [CacheTag; 4] = [
        CacheTag::Facebook,
        CacheTag::PageInfo,
        CacheTag::Posts,
        CacheTag::Engagement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheTag::Facebook => "facebook",
            CacheTag::PageInfo => "page-info",
            CacheTag::Posts => "posts",
            CacheTag::Engagement => "engagement",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheTag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("Unknown cache tag: {}", s))
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    generation: u64,
    invalidated_at: HashMap<CacheTag, u64>,
}

/// Shared record of when each tag was last invalidated
#[derive(Debug, Default)]
pub struct TagLedger {
    state: Mutex<LedgerState>,
}

impl TagLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation to stamp on an entry whose fetch starts now
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    /// Mark every tag in `tags` as invalidated now
    pub async fn invalidate(&self, tags: &[CacheTag]) {
        let mut state = self.state.lock().await;
        state.generation += 1;
        let generation = state.generation;
        for tag in tags {
            state.invalidated_at.insert(*tag, generation);
        }
        tracing::debug!(generation, tags = ?tags, "Invalidated cache tags");
    }

    /// Whether any of `tags` was invalidated after `generation`
    pub async fn invalidated_since(&self, tags: &[CacheTag], generation: u64) -> bool {
        let state = self.state.lock().await;
        tags.iter().any(|tag| {
            state
                .invalidated_at
                .get(tag)
                .is_some_and(|stamp| *stamp > generation)
        })
    }
}
