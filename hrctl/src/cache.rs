//! In-memory key/value cache for computed analytics metrics.
//!
//! Entries never expire on their own. They are dropped explicitly through
//! [`MetricsCache::invalidate`], which takes a glob pattern where `*` matches any run of
//! characters.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

/// A cached metric result and when it was computed
#[derive(Debug, Clone)]
pub struct CachedMetric {
    pub rows: Value,
    pub generated_at: DateTime<Utc>,
}

/// Shared cache handle; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MetricsCache {
    entries: Arc<DashMap<String, CachedMetric>>,
}

impl MetricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CachedMetric> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: String, value: CachedMetric) {
        self.entries.insert(key, value);
    }

    /// Sorted list of the keys currently cached
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove entries matching `pattern`, or everything when no pattern is given.
    /// Returns how many entries were removed.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let before = self.entries.len();
        match pattern {
            None => self.entries.clear(),
            Some(pattern) => self.entries.retain(|key, _| !glob_match(pattern, key)),
        }
        before.saturating_sub(self.entries.len())
    }
}

/// Cache key for a metric and its parameters. Absent parameters are spelled `-`.
pub fn metric_key(metric: &str, params: &[(&str, Option<String>)]) -> String {
    let mut key = metric.to_string();
    for (name, value) in params {
        key.push(':');
        key.push_str(name);
        key.push('=');
        key.push_str(value.as_deref().unwrap_or("-"));
    }
    key
}

/// Glob match supporting only `*`
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    if segments.len() == 1 {
        return pattern == text;
    }

    // At least two segments from here on
    let first = segments[0];
    let last = segments[segments.len() - 1];
    let Some(mut remaining) = text.strip_prefix(first) else {
        return false;
    };

    for segment in &segments[1..segments.len() - 1] {
        match remaining.find(segment) {
            Some(index) => remaining = &remaining[index + segment.len()..],
            None => return false,
        }
    }
    remaining.len() >= last.len() && remaining.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> CachedMetric {
        CachedMetric {
            rows: json!([]),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("headcount_by_department", "headcount_by_department"));
        assert!(!glob_match("headcount", "headcount_by_department"));
        assert!(glob_match("headcount*", "headcount_by_department"));
        assert!(glob_match("*department*", "average_salary_by_department:from=-"));
        assert!(glob_match("*", ""));
        assert!(glob_match("a*b*c", "aXXbYYc"));
        assert!(!glob_match("a*b*c", "aXXcYYb"));
        assert!(!glob_match("ab*ba", "aba"));
        assert!(glob_match("*:department_id=3*", "new_hires_by_month:department_id=3:from=-"));
    }

    #[test]
    fn test_metric_key() {
        let key = metric_key(
            "new_hires_by_month",
            &[("department_id", Some("3".to_string())), ("from", None)],
        );
        assert_eq!(key, "new_hires_by_month:department_id=3:from=-");
    }

    #[test]
    fn test_invalidate_by_pattern() {
        let cache = MetricsCache::new();
        cache.insert("headcount_by_department".to_string(), entry());
        cache.insert("headcount_by_branch".to_string(), entry());
        cache.insert("payroll_cost_by_run".to_string(), entry());

        assert_eq!(cache.invalidate(Some("headcount_*")), 2);
        assert_eq!(cache.keys(), vec!["payroll_cost_by_run".to_string()]);
        assert_eq!(cache.invalidate(Some("nothing*")), 0);
    }

    #[test]
    fn test_invalidate_everything() {
        let cache = MetricsCache::new();
        cache.insert("a".to_string(), entry());
        cache.insert("b".to_string(), entry());
        assert_eq!(cache.invalidate(None), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = MetricsCache::new();
        let clone = cache.clone();
        clone.insert("k".to_string(), entry());
        assert!(cache.get("k").is_some());
        assert_eq!(cache.len(), 1);
    }
}
