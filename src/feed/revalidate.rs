//! Cache revalidation requests
//!
//! Callers name logical groups (`posts`, `page-info`, `engagement`, `all`);
//! each maps onto the underlying cache tags, de-duplicated in first-seen order.

use crate::cache::CacheTag;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Logical names accepted by the revalidation endpoint
pub const LOGICAL_TAGS: [&str; 4] = ["posts", "page-info", "engagement", "all"];

/// A logical group of cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevalidationTarget {
    Posts,
    PageInfo,
    Engagement,
    All,
}

impl RevalidationTarget {
    /// Underlying tags invalidated for this group
    pub fn tags(&self) -> &'static [CacheTag] {
        match self {
            RevalidationTarget::Posts => &[CacheTag::Facebook, CacheTag::Posts],
            RevalidationTarget::PageInfo => &[CacheTag::Facebook, CacheTag::PageInfo],
            RevalidationTarget::Engagement => &[CacheTag::Facebook, CacheTag::Engagement],
            RevalidationTarget::All => &[CacheTag::Facebook],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RevalidationTarget::Posts => "Revalidate posts cache",
            RevalidationTarget::PageInfo => "Revalidate page info cache",
            RevalidationTarget::Engagement => "Revalidate engagement data cache",
            RevalidationTarget::All => "Revalidate all Facebook caches",
        }
    }
}

impl FromStr for RevalidationTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(RevalidationTarget::Posts),
            "page-info" => Ok(RevalidationTarget::PageInfo),
            "engagement" => Ok(RevalidationTarget::Engagement),
            "all" => Ok(RevalidationTarget::All),
            other => Err(format!("Unknown revalidation tag: {}", other)),
        }
    }
}

impl fmt::Display for RevalidationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RevalidationTarget::Posts => "posts",
            RevalidationTarget::PageInfo => "page-info",
            RevalidationTarget::Engagement => "engagement",
            RevalidationTarget::All => "all",
        };
        f.write_str(name)
    }
}

/// Map logical names onto cache tags, each tag at most once
///
/// Unknown names are skipped.
pub fn resolve_tags<S: AsRef<str>>(names: &[S]) -> Vec<CacheTag> {
    let mut tags: Vec<CacheTag> = Vec::new();
    for name in names {
        match name.as_ref().parse::<RevalidationTarget>() {
            Ok(target) => {
                for tag in target.tags() {
                    if !tags.contains(tag) {
                        tags.push(*tag);
                    }
                }
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring revalidation tag"),
        }
    }
    tags
}

/// Result of a revalidation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidationOutcome {
    pub revalidated_tags: Vec<CacheTag>,
    pub timestamp: DateTime<Utc>,
}

/// Compare a presented secret with the configured one
///
/// With no secret configured every request is rejected.
pub fn secret_matches(configured: Option<&str>, presented: &str) -> bool {
    match configured {
        Some(expected) if !expected.is_empty() => {
            let (a, b) = (expected.as_bytes(), presented.as_bytes());
            a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_maps_to_umbrella_and_posts() {
        assert_eq!(
            resolve_tags(&["posts"]),
            vec![CacheTag::Facebook, CacheTag::Posts]
        );
    }

    #[test]
    fn test_all_maps_to_umbrella_only() {
        assert_eq!(resolve_tags(&["all"]), vec![CacheTag::Facebook]);
    }

    #[test]
    fn test_each_tag_once_in_first_seen_order() {
        let tags = resolve_tags(&["page-info", "posts", "all", "posts"]);
        assert_eq!(
            tags,
            vec![CacheTag::Facebook, CacheTag::PageInfo, CacheTag::Posts]
        );
    }

    #[test]
    fn test_unknown_names_ignored() {
        assert!(resolve_tags(&["comments", "facebook"]).is_empty());
        let tags = resolve_tags(&["nope".to_string(), "engagement".to_string()]);
        assert_eq!(tags, vec![CacheTag::Facebook, CacheTag::Engagement]);
    }

    #[test]
    fn test_target_names_round_trip() {
        for name in LOGICAL_TAGS {
            let target: RevalidationTarget = name.parse().unwrap();
            assert_eq!(target.to_string(), name);
        }
    }

    #[test]
    fn test_secret_matching() {
        assert!(secret_matches(Some("s3cret"), "s3cret"));
        assert!(!secret_matches(Some("s3cret"), "s3cre"));
        assert!(!secret_matches(Some("s3cret"), "S3cret"));
        assert!(!secret_matches(None, ""));
        assert!(!secret_matches(Some(""), ""));
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = RevalidationOutcome {
            revalidated_tags: vec![CacheTag::Facebook, CacheTag::Posts],
            timestamp: "2026-01-01T00:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["revalidatedTags"], serde_json::json!(["facebook", "posts"]));
        assert_eq!(json["timestamp"], "2026-01-01T00:00:00Z");
    }
}
