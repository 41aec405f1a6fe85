//! Reference-link registry.
//!
//! Maps reference names to resolved targets and the lines that consume them.
//! Forward references are first-class: using `[foo][bar]` before `[bar]:`
//! exists creates an unresolved entry, and the later definition reports
//! which consumer lines need re-rendering so they flip from "missing" to
//! resolved styling without the user touching them.
//!
//! Names are never removed; redefining a name simply replaces its target
//! (last definition wins).

use std::collections::HashMap;

use crate::editing::document::LineId;

#[derive(Debug, Default)]
struct ReferenceEntry {
    target: Option<String>,
    consumers: Vec<LineId>,
}

/// Session-scoped name → target table for reference-style links and images.
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    entries: HashMap<String, ReferenceEntry>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the target for `name` and returns the consumer
    /// lines that should be re-rendered to pick up the new resolution.
    pub fn define(&mut self, name: &str, target: &str) -> Vec<LineId> {
        let entry = self.entries.entry(name.to_string()).or_default();
        entry.target = Some(target.to_string());
        entry.consumers.clone()
    }

    /// Creates an unresolved entry for `name` if none exists yet.
    pub fn ensure(&mut self, name: &str) {
        self.entries.entry(name.to_string()).or_default();
    }

    /// Registers `consumer` as a user of `name`, creating an unresolved
    /// entry on first use. Returns the current target, if any.
    pub fn use_reference(&mut self, name: &str, consumer: LineId) -> Option<&str> {
        let entry = self.entries.entry(name.to_string()).or_default();
        if !entry.consumers.contains(&consumer) {
            entry.consumers.push(consumer);
        }
        entry.target.as_deref()
    }

    /// True if `name` currently has a target.
    pub fn resolved(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| entry.target.is_some())
    }

    pub fn target(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|entry| entry.target.as_deref())
    }

    /// Drops `line` from every consumer list. Called before a line re-renders
    /// (it re-registers during extraction) and when a line is destroyed, so
    /// no entry ever holds a dangling consumer.
    pub fn prune_consumer(&mut self, line: LineId) {
        for entry in self.entries.values_mut() {
            entry.consumers.retain(|c| *c != line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: u64) -> LineId {
        LineId(n)
    }

    #[test]
    fn forward_reference_resolves_on_definition() {
        let mut refs = ReferenceRegistry::new();

        assert_eq!(refs.use_reference("bar", line(1)), None);
        assert!(!refs.resolved("bar"));

        let consumers = refs.define("bar", "http://x");
        assert_eq!(consumers, vec![line(1)]);
        assert!(refs.resolved("bar"));
        assert_eq!(refs.target("bar"), Some("http://x"));
    }

    #[test]
    fn redefinition_wins_and_keeps_consumers() {
        let mut refs = ReferenceRegistry::new();
        refs.use_reference("a", line(1));
        refs.define("a", "first");
        let consumers = refs.define("a", "second");

        assert_eq!(consumers, vec![line(1)]);
        assert_eq!(refs.target("a"), Some("second"));
    }

    #[test]
    fn consumers_deduplicate_per_line() {
        let mut refs = ReferenceRegistry::new();
        refs.use_reference("a", line(1));
        refs.use_reference("a", line(1));
        refs.use_reference("a", line(2));

        assert_eq!(refs.define("a", "t"), vec![line(1), line(2)]);
    }

    #[test]
    fn pruned_consumers_are_forgotten() {
        let mut refs = ReferenceRegistry::new();
        refs.use_reference("a", line(1));
        refs.use_reference("a", line(2));
        refs.prune_consumer(line(1));

        assert_eq!(refs.define("a", "t"), vec![line(2)]);
    }
}
