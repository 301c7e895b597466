//! Time-windowed dedupe ledgers.

use std::collections::HashMap;
use std::time::Duration;

use steptrail_protocols::{ElementFingerprint, MessageKind};
use tokio::time::Instant;

/// Dedupe ledger for critical-path sends, keyed by event kind and element.
#[derive(Debug)]
pub struct CriticalLedger {
    window: Duration,
    entries: HashMap<String, Instant>,
}

impl CriticalLedger {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Key for an event; never includes a timestamp.
    pub fn dedupe_key(kind: MessageKind, fingerprint: &ElementFingerprint) -> String {
        format!("{}_{}", kind, fingerprint)
    }

    /// Prune stale entries, then admit `key` unless it was stamped within
    /// the window. An admitted key is stamped with `now`.
    pub fn admit(&mut self, key: &str, now: Instant) -> bool {
        let window = self.window;
        self.entries
            .retain(|_, stamp| now.saturating_duration_since(*stamp) <= window);

        if let Some(stamp) = self.entries.get(key) {
            if now.saturating_duration_since(*stamp) < window {
                return false;
            }
        }

        self.entries.insert(key.to_string(), now);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Enter-key coordination state.
///
/// Holds the processing cool-down, the per-element repeat ledger and the
/// "recent Enter" stamp consulted by the submit listener.
#[derive(Debug)]
pub struct EnterGate {
    cooldown: Duration,
    window: Duration,
    submit_grace: Duration,
    busy_until: Option<Instant>,
    last_by_fingerprint: HashMap<ElementFingerprint, Instant>,
    recent_enter: Option<Instant>,
}

impl EnterGate {
    pub fn new(cooldown: Duration, window: Duration, submit_grace: Duration) -> Self {
        Self {
            cooldown,
            window,
            submit_grace,
            busy_until: None,
            last_by_fingerprint: HashMap::new(),
            recent_enter: None,
        }
    }

    /// Enter processing slot; at most one Enter per cool-down.
    pub fn begin(&mut self, now: Instant) -> bool {
        if self.busy_until.is_some_and(|until| now < until) {
            return false;
        }
        self.busy_until = Some(now + self.cooldown);
        true
    }

    /// Admit an Enter on `fingerprint`. Stamps the recent-Enter marker even
    /// when the press is rejected as a repeat.
    pub fn admit(&mut self, fingerprint: &ElementFingerprint, now: Instant) -> bool {
        self.recent_enter = Some(now);

        if let Some(last) = self.last_by_fingerprint.get(fingerprint) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        self.last_by_fingerprint.insert(fingerprint.clone(), now);

        let horizon = self.window * 2;
        self.last_by_fingerprint
            .retain(|_, stamp| now.saturating_duration_since(*stamp) <= horizon);
        true
    }

    /// Whether a submit at `now` should be attributed to the last Enter.
    pub fn submit_follows_enter(&self, now: Instant) -> bool {
        self.recent_enter
            .is_some_and(|at| now.saturating_duration_since(at) < self.submit_grace)
    }

    pub fn tracked(&self) -> usize {
        self.last_by_fingerprint.len()
    }

    pub fn clear(&mut self) {
        self.busy_until = None;
        self.last_by_fingerprint.clear();
        self.recent_enter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_dedupe_key_excludes_time() {
        let fp = ElementFingerprint::new("/html/body/form/button");
        assert_eq!(
            CriticalLedger::dedupe_key(MessageKind::Clicked, &fp),
            "clicked_/html/body/form/button"
        );
    }

    #[test]
    fn test_critical_window() {
        let start = Instant::now();
        let mut ledger = CriticalLedger::new(ms(400));
        assert!(ledger.admit("clicked_/a", start));
        assert!(!ledger.admit("clicked_/a", start + ms(100)));
        assert!(ledger.admit("clicked_/a", start + ms(500)));
    }

    #[test]
    fn test_keys_are_exact_not_prefixes() {
        let start = Instant::now();
        let mut ledger = CriticalLedger::new(ms(400));
        assert!(ledger.admit("clicked_/html/body/a", start));
        assert!(ledger.admit("clicked_/html/body/a[1]", start));
        assert!(ledger.admit("typed_/html/body/a", start));
    }

    #[test]
    fn test_stale_entries_pruned_on_admit() {
        let start = Instant::now();
        let mut ledger = CriticalLedger::new(ms(400));
        ledger.admit("clicked_/a", start);
        ledger.admit("clicked_/b", start + ms(10));
        assert_eq!(ledger.len(), 2);
        ledger.admit("clicked_/c", start + ms(1000));
        assert_eq!(ledger.len(), 1);
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_enter_cooldown() {
        let start = Instant::now();
        let mut gate = EnterGate::new(ms(100), ms(500), ms(100));
        assert!(gate.begin(start));
        assert!(!gate.begin(start + ms(50)));
        assert!(gate.begin(start + ms(100)));
    }

    #[test]
    fn test_enter_repeat_window_per_element() {
        let start = Instant::now();
        let mut gate = EnterGate::new(ms(100), ms(500), ms(100));
        let input = ElementFingerprint::new("/html/body/input");
        let other = ElementFingerprint::new("/html/body/textarea");
        assert!(gate.admit(&input, start));
        assert!(!gate.admit(&input, start + ms(200)));
        assert!(gate.admit(&other, start + ms(200)));
        assert!(gate.admit(&input, start + ms(600)));
    }

    #[test]
    fn test_enter_ledger_stale_horizon() {
        let start = Instant::now();
        let mut gate = EnterGate::new(ms(100), ms(500), ms(100));
        gate.admit(&ElementFingerprint::new("/a"), start);
        gate.admit(&ElementFingerprint::new("/b"), start + ms(900));
        assert_eq!(gate.tracked(), 2);
        gate.admit(&ElementFingerprint::new("/c"), start + ms(1100));
        assert_eq!(gate.tracked(), 2);
    }

    #[test]
    fn test_submit_follows_enter() {
        let start = Instant::now();
        let mut gate = EnterGate::new(ms(100), ms(500), ms(100));
        assert!(!gate.submit_follows_enter(start));
        let input = ElementFingerprint::new("/html/body/input");
        gate.admit(&input, start);
        assert!(gate.submit_follows_enter(start + ms(40)));
        assert!(!gate.submit_follows_enter(start + ms(150)));

        // a rejected repeat still refreshes the marker
        assert!(!gate.admit(&input, start + ms(300)));
        assert!(gate.submit_follows_enter(start + ms(350)));

        gate.clear();
        assert!(!gate.submit_follows_enter(start + ms(350)));
    }
}
