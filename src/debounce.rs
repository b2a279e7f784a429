//! Per-field input debouncing.
//!
//! Rapid keystrokes in a filter input should produce one refetch, not one per
//! character. The debouncer holds the latest value for each field and releases
//! it once the field has been quiet for the configured period. Time is passed
//! in explicitly so hosts can drive it from any clock.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::events::GridEvent;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
struct Pending {
    value: String,
    last_change: Instant,
}

#[derive(Debug, Clone)]
pub struct InputDebouncer {
    quiet: Duration,
    pending: BTreeMap<String, Pending>,
}

impl Default for InputDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl InputDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: BTreeMap::new(),
        }
    }

    /// Record a new value for `field`, replacing any unreleased one.
    pub fn push(&mut self, field: &str, value: impl Into<String>, now: Instant) {
        self.pending.insert(
            field.to_string(),
            Pending {
                value: value.into(),
                last_change: now,
            },
        );
    }

    /// Release every field quiet for at least the configured period.
    pub fn release(&mut self, now: Instant) -> Vec<GridEvent> {
        let ready: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, p)| now.saturating_duration_since(p.last_change) >= self.quiet)
            .map(|(field, _)| field.clone())
            .collect();

        ready
            .into_iter()
            .filter_map(|field| {
                self.pending
                    .remove(&field)
                    .map(|p| GridEvent::FilterChanged {
                        field,
                        value: p.value,
                    })
            })
            .collect()
    }

    /// When the next field becomes ready, if any are pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .values()
            .map(|p| p.last_change + self.quiet)
            .min()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalesces_rapid_changes() {
        let start = Instant::now();
        let mut debouncer = InputDebouncer::default();
        debouncer.push("name", "s", start);
        debouncer.push("name", "sm", start + Duration::from_millis(50));
        debouncer.push("name", "smith", start + Duration::from_millis(120));

        assert!(debouncer.release(start + Duration::from_millis(250)).is_empty());
        let released = debouncer.release(start + Duration::from_millis(320));
        assert_eq!(
            released,
            vec![GridEvent::FilterChanged {
                field: "name".into(),
                value: "smith".into()
            }]
        );
        assert!(debouncer.is_idle());
    }

    #[test]
    fn test_fields_are_independent() {
        let start = Instant::now();
        let mut debouncer = InputDebouncer::new(Duration::from_millis(100));
        debouncer.push("a", "1", start);
        debouncer.push("b", "2", start + Duration::from_millis(80));

        let released = debouncer.release(start + Duration::from_millis(100));
        assert_eq!(released.len(), 1);
        assert_eq!(
            debouncer.next_deadline(),
            Some(start + Duration::from_millis(180))
        );
    }
}
