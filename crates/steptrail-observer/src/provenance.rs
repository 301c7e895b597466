//! Visibility provenance tracking for one page.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use steptrail_protocols::{ElementFingerprint, MessageKind, TriggerElement, VisibilityProvenance};

/// One recorded interaction, kept for provenance synthesis.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    pub kind: MessageKind,
    pub trigger: TriggerElement,
    pub recorded_at: DateTime<Utc>,
}

/// Page-scoped provenance state.
///
/// Entries in the provenance map are only ever added; the first assignment
/// for a fingerprint is permanent until [`ProvenanceTracker::clear`].
#[derive(Debug)]
pub struct ProvenanceTracker {
    initial: HashSet<ElementFingerprint>,
    assigned: HashMap<ElementFingerprint, VisibilityProvenance>,
    history: VecDeque<ActionRecord>,
    history_limit: usize,
    loaded: bool,
}

impl ProvenanceTracker {
    pub fn new(history_limit: usize) -> Self {
        Self {
            initial: HashSet::new(),
            assigned: HashMap::new(),
            history: VecDeque::new(),
            history_limit,
            loaded: false,
        }
    }

    /// Whether the initial visible set has been captured.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Record the initial visible set with page provenance.
    pub fn seed_initial<I>(&mut self, visible: I, base_url: &str) -> usize
    where
        I: IntoIterator<Item = ElementFingerprint>,
    {
        self.initial = visible.into_iter().collect();
        for fp in &self.initial {
            self.assigned
                .entry(fp.clone())
                .or_insert_with(|| VisibilityProvenance::page(base_url));
        }
        self.loaded = true;
        self.initial.len()
    }

    /// Fold late-loading elements into the initial set. Returns how many
    /// were added.
    pub fn fold_late<I>(&mut self, visible: I, base_url: &str) -> usize
    where
        I: IntoIterator<Item = ElementFingerprint>,
    {
        let mut added = 0;
        for fp in visible {
            if self.initial.contains(&fp) || self.assigned.contains_key(&fp) {
                continue;
            }
            self.assigned
                .insert(fp.clone(), VisibilityProvenance::page(base_url));
            self.initial.insert(fp);
            added += 1;
        }
        added
    }

    /// Append to the bounded action history.
    pub fn record_action(&mut self, kind: MessageKind, trigger: TriggerElement) {
        self.history.push_back(ActionRecord {
            kind,
            trigger,
            recorded_at: Utc::now(),
        });
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    /// Attribute elements that are visible now but were neither initially
    /// visible nor already assigned. Returns how many were attributed.
    pub fn attribute_new<I>(&mut self, visible: I, trigger: &TriggerElement) -> usize
    where
        I: IntoIterator<Item = ElementFingerprint>,
    {
        let mut added = 0;
        for fp in visible {
            if self.initial.contains(&fp) || self.assigned.contains_key(&fp) {
                continue;
            }
            self.assigned
                .insert(fp, VisibilityProvenance::interaction(trigger.clone()));
            added += 1;
        }
        added
    }

    /// Provenance for `fp`, synthesizing one when nothing was assigned.
    ///
    /// A synthesized interaction provenance is persisted so later lookups
    /// return the same record.
    pub fn resolve(
        &mut self,
        fp: &ElementFingerprint,
        currently_visible: bool,
        base_url: &str,
    ) -> VisibilityProvenance {
        if let Some(existing) = self.assigned.get(fp) {
            return existing.clone();
        }

        if currently_visible {
            if self.initial.contains(fp) {
                return VisibilityProvenance::page(base_url);
            }
            if self.loaded {
                if let Some(last) = self.history.back() {
                    let provenance = VisibilityProvenance::interaction(last.trigger.clone());
                    self.assigned.insert(fp.clone(), provenance.clone());
                    return provenance;
                }
            }
        }

        VisibilityProvenance::page(base_url)
    }

    pub fn get(&self, fp: &ElementFingerprint) -> Option<&VisibilityProvenance> {
        self.assigned.get(fp)
    }

    pub fn last_action(&self) -> Option<&ActionRecord> {
        self.history.back()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn initial_len(&self) -> usize {
        self.initial.len()
    }

    /// Drop all page-scoped state.
    pub fn clear(&mut self) {
        self.initial.clear();
        self.assigned.clear();
        self.history.clear();
        self.loaded = false;
    }
}
