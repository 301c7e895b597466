//! The live session: numbered steps, session-JSON entries and screenshots.

use chrono::Utc;
use steptrail_protocols::{ElementSnapshot, Screenshot};
use tracing::debug;
use uuid::Uuid;

use crate::compare::entries_identical;
use crate::step::{ActionKind, SessionEntry, SessionStep};

/// Hostname without a leading `www.`, or the raw URL when it does not parse.
pub fn navigate_path(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_else(|| url.to_string())
}

/// One recording session.
///
/// Steps, entries and screenshots are kept in step-id order and change
/// together. Step ids start at 1 and are never reused until [`Session::clear`].
#[derive(Debug)]
pub struct Session {
    steps: Vec<SessionStep>,
    entries: Vec<SessionEntry>,
    screenshots: Vec<Screenshot>,
    next_step_id: u64,
    navigate_seeded: bool,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            entries: Vec::new(),
            screenshots: Vec::new(),
            next_step_id: 1,
            navigate_seeded: false,
            generation: 0,
        }
    }

    /// Bumped by [`Session::clear`]; late screenshots carry the generation
    /// they were requested in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn next_step_id(&self) -> u64 {
        self.next_step_id
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[SessionStep] {
        &self.steps
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn screenshots(&self) -> &[Screenshot] {
        &self.screenshots
    }

    pub fn step(&self, step_id: u64) -> Option<&SessionStep> {
        self.steps.iter().find(|step| step.step_id == step_id)
    }

    pub fn step_by_uuid(&self, id: Uuid) -> Option<&SessionStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn steps_by_kind(&self, kind: ActionKind) -> Vec<&SessionStep> {
        self.steps.iter().filter(|step| step.kind == kind).collect()
    }

    pub fn last_entry(&self) -> Option<&SessionEntry> {
        self.entries.last()
    }

    fn take_step_id(&mut self) -> u64 {
        let step_id = self.next_step_id;
        self.next_step_id += 1;
        step_id
    }

    /// Insert the leading `navigate` step. Happens at most once per session
    /// and only while the session is still empty.
    pub fn seed_navigate(&mut self, url: &str) -> Option<u64> {
        if self.navigate_seeded || url.is_empty() {
            return None;
        }
        self.navigate_seeded = true;
        if !self.steps.is_empty() {
            return None;
        }

        let step_id = self.take_step_id();
        let now = Utc::now();
        self.steps.insert(
            0,
            SessionStep {
                id: Uuid::new_v4(),
                step_id,
                kind: ActionKind::Navigate,
                path: navigate_path(url),
                url: url.to_string(),
                element: None,
                input: None,
                created_at: now,
            },
        );
        self.entries.insert(
            0,
            SessionEntry {
                step_id,
                url: url.to_string(),
                action: ActionKind::Navigate,
                element: None,
                keyboard_input: None,
                step_type: Some("act".to_string()),
                timestamp: Some(now),
            },
        );
        Some(step_id)
    }

    /// Append a step unless it repeats the last accepted entry.
    pub fn try_append(
        &mut self,
        kind: ActionKind,
        url: &str,
        element: ElementSnapshot,
        input: Option<String>,
    ) -> Option<&SessionStep> {
        let entry = SessionEntry {
            step_id: self.next_step_id,
            url: url.to_string(),
            action: kind,
            element: Some(element.clone()),
            keyboard_input: input.clone(),
            step_type: None,
            timestamp: None,
        };
        if self
            .entries
            .last()
            .is_some_and(|last| entries_identical(&entry, last))
        {
            debug!("Dropping duplicate {} entry for {}", kind, element.fingerprint);
            return None;
        }

        let step_id = self.take_step_id();
        self.entries.push(entry);
        self.steps.push(SessionStep {
            id: Uuid::new_v4(),
            step_id,
            kind,
            path: element.fingerprint.to_string(),
            url: url.to_string(),
            element: Some(element),
            input,
            created_at: Utc::now(),
        });
        self.steps.last()
    }

    /// Update the last step in place when it is a `typed` step on
    /// `fingerprint`. Returns its step id.
    pub fn coalesce_typed(&mut self, fingerprint: &str, value: Option<String>) -> Option<u64> {
        let last = self.steps.last_mut()?;
        if last.kind != ActionKind::Typed || last.path != fingerprint {
            return None;
        }
        last.input = value.clone();
        let step_id = last.step_id;

        if let Some(entry) = self.entries.last_mut() {
            if entry.action == ActionKind::Typed && entry.fingerprint() == Some(fingerprint) {
                entry.keyboard_input = value;
            }
        }
        Some(step_id)
    }

    /// Bind a screenshot to its step. Rejected when the session was cleared
    /// since the capture was requested or the step no longer exists.
    pub fn attach_screenshot(&mut self, generation: u64, screenshot: Screenshot) -> bool {
        if generation != self.generation || self.step(screenshot.step_id).is_none() {
            return false;
        }
        self.screenshots
            .retain(|existing| existing.step_id != screenshot.step_id);
        self.screenshots.push(screenshot);
        true
    }

    /// Remove a step with its entry and screenshot. Remaining step ids are
    /// left untouched.
    pub fn delete_step(&mut self, step_id: u64) -> bool {
        let before = self.steps.len();
        self.steps.retain(|step| step.step_id != step_id);
        self.entries.retain(|entry| entry.step_id != step_id);
        self.screenshots.retain(|shot| shot.step_id != step_id);
        self.steps.len() != before
    }

    /// Drop everything and restart numbering at 1.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.entries.clear();
        self.screenshots.clear();
        self.next_step_id = 1;
        self.navigate_seeded = false;
        self.generation += 1;
    }

    /// The session JSON payload.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
