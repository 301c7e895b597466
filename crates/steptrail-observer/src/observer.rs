//! The page observer: event handlers and page-scoped state.

use std::sync::Arc;

use parking_lot::Mutex;
use steptrail_config::ObserverConfig;
use steptrail_protocols::{
    ElementFingerprint, ElementSnapshot, InteractionReport, MessageKind, NavigationMethod,
    ReportSink, VisibilityProvenance,
};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::classify::{is_navigational, is_text_entry, is_visible};
use crate::delivery::Dispatcher;
use crate::dom::{NodeId, PageDom, ReadyState};
use crate::events::{
    Dispatch, InputEvent, KeyEvent, PointerEvent, PointerKind, SubmitEvent, SuppressReason,
};
use crate::fingerprint::fingerprint;
use crate::hit_test::resolve_target;
use crate::ledger::{CriticalLedger, EnterGate};
use crate::provenance::ProvenanceTracker;
use crate::snapshot::SnapshotBuilder;

/// URL without its query string.
pub fn base_url(href: &str) -> String {
    href.split_once('?')
        .map_or(href, |(base, _)| base)
        .to_string()
}

fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn visible_fingerprints(dom: &dyn PageDom) -> Vec<ElementFingerprint> {
    dom.all_elements()
        .into_iter()
        .filter(|node| is_visible(dom, *node))
        .filter_map(|node| fingerprint(dom, node))
        .collect()
}

/// State owned by one observed page. Cleared only by [`PageState::reset`].
struct PageState {
    /// Bumped on every reset; timers scheduled in an older episode no-op.
    episode: u64,
    base_url: Option<String>,
    last_location: Option<String>,
    tracker: ProvenanceTracker,
    critical: CriticalLedger,
    enter: EnterGate,
    navigation_captured: bool,
    last_pointer: Option<Instant>,
}

impl PageState {
    fn new(config: &ObserverConfig) -> Self {
        Self {
            episode: 0,
            base_url: None,
            last_location: None,
            tracker: ProvenanceTracker::new(config.action_history_limit),
            critical: CriticalLedger::new(config.critical_window()),
            enter: EnterGate::new(
                config.enter_cooldown(),
                config.enter_window(),
                config.submit_after_enter(),
            ),
            navigation_captured: false,
            last_pointer: None,
        }
    }

    fn reset(&mut self) {
        self.episode += 1;
        self.tracker.clear();
        self.critical.clear();
        self.enter.clear();
        self.navigation_captured = false;
    }
}

/// Critical sends made while handling one event.
#[derive(Default)]
struct Escalation {
    attempted: bool,
    admitted: bool,
}

impl Escalation {
    fn record(&mut self, admitted: bool) {
        self.attempted = true;
        self.admitted |= admitted;
    }

    fn outcome(&self, standard: bool, otherwise: SuppressReason) -> Dispatch {
        match (self.admitted, self.attempted, standard) {
            (true, _, standard) => Dispatch::Critical { standard },
            (false, true, standard) => Dispatch::Deduplicated { standard },
            (false, false, true) => Dispatch::Standard,
            (false, false, false) => Dispatch::Suppressed(otherwise),
        }
    }
}

/// Observes one page and reports interactions to a [`ReportSink`].
///
/// Handlers are synchronous, mirroring host event callbacks; delivery and
/// the settle/rescan timers run as spawned tokio tasks, so the handlers must
/// be called from within a runtime.
pub struct PageObserver {
    dom: Arc<dyn PageDom>,
    dispatcher: Dispatcher,
    config: ObserverConfig,
    state: Arc<Mutex<PageState>>,
}

impl PageObserver {
    pub fn new(dom: Arc<dyn PageDom>, sink: Arc<dyn ReportSink>, config: ObserverConfig) -> Self {
        let dispatcher = Dispatcher::new(sink, config.delivery_delays());
        let state = Arc::new(Mutex::new(PageState::new(&config)));
        Self {
            dom,
            dispatcher,
            config,
            state,
        }
    }

    pub fn dom(&self) -> &Arc<dyn PageDom> {
        &self.dom
    }

    /// Current navigation episode.
    pub fn episode(&self) -> u64 {
        self.state.lock().episode
    }

    /// Whether the initial visible set has been captured for this page.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().tracker.is_loaded()
    }

    /// Attach to the page: run the page-change check and initialize unless
    /// the document is still loading.
    pub fn start(&self) {
        let mut state = self.state.lock();
        state.last_location = Some(self.dom.location());
        self.setup(&mut state);
    }

    pub fn on_dom_ready(&self) {
        let mut state = self.state.lock();
        self.initialize(&mut state);
    }

    /// Fallback initialization; no-op when already initialized.
    pub fn on_window_load(&self) {
        let mut state = self.state.lock();
        if !state.tracker.is_loaded() {
            debug!("Initializing from window load fallback");
            self.initialize(&mut state);
        }
    }

    /// DOM mutation callback; re-runs setup when the location changed.
    pub fn on_location_mutation(&self) {
        let href = self.dom.location();
        let mut state = self.state.lock();
        if state.last_location.as_deref() != Some(href.as_str()) {
            debug!("Location changed to {}", href);
            state.last_location = Some(href);
            self.setup(&mut state);
        }
    }

    /// `pagehide` / `beforeunload`.
    pub fn on_unload(&self) {
        let mut state = self.state.lock();
        state.reset();
        info!("Page unloading, cleared page state");
    }

    pub fn on_pointer(&self, event: PointerEvent) -> Dispatch {
        let dom = self.dom.as_ref();
        let mut state = self.state.lock();
        self.check_page_change(&mut state);
        let now = Instant::now();
        let mut escalation = Escalation::default();

        // Navigational mousedowns are escalated before debounce and resolution.
        if event.kind == PointerKind::MouseDown && is_navigational(dom, event.target) {
            if let Some(snapshot) = self.snapshot_of(&mut state, event.target) {
                self.track_interaction(&mut state, MessageKind::Clicked, &snapshot);
                let report = InteractionReport::new(MessageKind::Clicked, snapshot, self.current_base())
                    .with_timestamp(unix_millis());
                escalation.record(self.send_critical(&mut state, report));
            }
        }

        let debounce = self.config.pointer_debounce();
        if state
            .last_pointer
            .is_some_and(|last| now.saturating_duration_since(last) < debounce)
        {
            debug!("Pointer event {:?} debounced", event.kind);
            return escalation.outcome(false, SuppressReason::Debounced);
        }
        state.last_pointer = Some(now);

        let resolution = resolve_target(dom, event.target, event.x, event.y);
        let Some(mut snapshot) = self.snapshot_of(&mut state, resolution.element) else {
            debug!("Pointer target detached");
            return escalation.outcome(false, SuppressReason::Detached);
        };
        snapshot.same_center_elements = SnapshotBuilder::new(dom)
            .same_center(snapshot.center(), self.config.same_center_tolerance_px);
        self.track_interaction(&mut state, MessageKind::Clicked, &snapshot);

        let report = InteractionReport::new(MessageKind::Clicked, snapshot, self.current_base());
        if is_navigational(dom, resolution.element) {
            escalation.record(self.send_critical(&mut state, report.clone()));
        }
        self.dispatcher.send_standard(report);
        escalation.outcome(true, SuppressReason::Debounced)
    }

    pub fn on_input(&self, event: InputEvent) -> Dispatch {
        let dom = self.dom.as_ref();
        let mut state = self.state.lock();
        self.check_page_change(&mut state);

        if !event.is_user_input {
            return Dispatch::Suppressed(SuppressReason::NotUserInput);
        }
        if !is_text_entry(dom, event.target) {
            return Dispatch::Suppressed(SuppressReason::NotTextEntry);
        }
        let Some(snapshot) = self.snapshot_of(&mut state, event.target) else {
            return Dispatch::Suppressed(SuppressReason::Detached);
        };

        let value = self.typed_value(&snapshot, event.target);
        self.track_interaction(&mut state, MessageKind::Typed, &snapshot);
        let report =
            InteractionReport::new(MessageKind::Typed, snapshot, self.current_base()).with_input(value);

        let mut escalation = Escalation::default();
        if is_navigational(dom, event.target) {
            escalation.record(self.send_critical(&mut state, report.clone()));
        }
        self.dispatcher.send_standard(report);
        escalation.outcome(true, SuppressReason::NotTextEntry)
    }

    pub fn on_keydown(&self, event: &KeyEvent) -> Dispatch {
        let dom = self.dom.as_ref();
        let mut state = self.state.lock();
        self.check_page_change(&mut state);

        if event.key != "Enter" {
            return Dispatch::Suppressed(SuppressReason::NotEnter);
        }
        let now = Instant::now();
        if !state.enter.begin(now) {
            debug!("Enter ignored during cool-down");
            return Dispatch::Suppressed(SuppressReason::EnterCooldown);
        }

        let Some(target) = event
            .target
            .or_else(|| dom.active_element())
            .or_else(|| dom.body())
        else {
            return Dispatch::Suppressed(SuppressReason::NoFocusedElement);
        };
        let Some(fp) = fingerprint(dom, target) else {
            return Dispatch::Suppressed(SuppressReason::Detached);
        };
        if !state.enter.admit(&fp, now) {
            debug!("Repeated Enter on {} suppressed", fp);
            return Dispatch::Suppressed(SuppressReason::RepeatedEnter);
        }
        let Some(snapshot) = self.snapshot_of(&mut state, target) else {
            return Dispatch::Suppressed(SuppressReason::Detached);
        };

        let value = self.typed_value(&snapshot, target);
        self.track_interaction(&mut state, MessageKind::Enter, &snapshot);
        let mut report = InteractionReport::new(MessageKind::Enter, snapshot, self.current_base())
            .with_timestamp(unix_millis());
        report.input_value = Some(value);

        if is_navigational(dom, target) {
            let mut escalation = Escalation::default();
            escalation.record(self.send_critical(&mut state, report));
            escalation.outcome(false, SuppressReason::RepeatedEnter)
        } else {
            self.dispatcher.send_standard(report);
            Dispatch::Standard
        }
    }

    pub fn on_submit(&self, event: SubmitEvent) -> Dispatch {
        let dom = self.dom.as_ref();
        let mut state = self.state.lock();
        self.check_page_change(&mut state);

        if state.enter.submit_follows_enter(Instant::now()) {
            debug!("Submit attributed to the preceding Enter");
            return Dispatch::Suppressed(SuppressReason::SubmitAfterEnter);
        }

        let element = match dom.active_element() {
            Some(active) if dom.contains(event.form, active) => active,
            _ => event.form,
        };
        let Some(snapshot) = self.snapshot_of(&mut state, element) else {
            return Dispatch::Suppressed(SuppressReason::Detached);
        };

        self.track_interaction(&mut state, MessageKind::FormSubmit, &snapshot);
        let report = InteractionReport::new(MessageKind::FormSubmit, snapshot, self.current_base())
            .with_timestamp(unix_millis());
        let mut escalation = Escalation::default();
        escalation.record(self.send_critical(&mut state, report));
        escalation.outcome(false, SuppressReason::SubmitAfterEnter)
    }

    /// Programmatic navigation (`pushState`, `replaceState`) or `popstate`.
    ///
    /// Must be called before the location changes. Captures the focused
    /// element at most once per navigation episode.
    pub fn on_history(&self, method: NavigationMethod) -> Dispatch {
        let dom = self.dom.as_ref();
        let mut state = self.state.lock();

        if state.navigation_captured {
            return Dispatch::Suppressed(SuppressReason::NavigationAlreadyCaptured);
        }
        state.navigation_captured = true;

        let Some(active) = dom.active_element().or_else(|| dom.body()) else {
            return Dispatch::Suppressed(SuppressReason::NoFocusedElement);
        };
        let Some(snapshot) = self.snapshot_of(&mut state, active) else {
            return Dispatch::Suppressed(SuppressReason::Detached);
        };

        info!("Emergency navigation capture via {:?}", method);
        let report = InteractionReport::new(
            MessageKind::EmergencyNavigationCapture,
            snapshot,
            self.current_base(),
        )
        .with_method(method)
        .with_timestamp(unix_millis());
        let mut escalation = Escalation::default();
        escalation.record(self.send_critical(&mut state, report));
        escalation.outcome(false, SuppressReason::NavigationAlreadyCaptured)
    }

    /// Snapshot of `node` as it would be reported now.
    pub fn snapshot(&self, node: NodeId) -> Option<ElementSnapshot> {
        let mut state = self.state.lock();
        self.snapshot_of(&mut state, node)
    }

    pub fn provenance_of(&self, node: NodeId) -> Option<VisibilityProvenance> {
        let fp = fingerprint(self.dom.as_ref(), node)?;
        let visible = is_visible(self.dom.as_ref(), node);
        let base = self.current_base();
        Some(self.state.lock().tracker.resolve(&fp, visible, &base))
    }

    fn current_base(&self) -> String {
        base_url(&self.dom.location())
    }

    fn setup(&self, state: &mut PageState) {
        self.check_page_change(state);
        if self.dom.ready_state() != ReadyState::Loading {
            self.initialize(state);
        }
    }

    /// Compare the base URL to the last one seen; reset on mismatch.
    fn check_page_change(&self, state: &mut PageState) {
        let current = self.current_base();
        if let Some(previous) = state.base_url.take() {
            if previous != current {
                info!("Page changed from {} to {}, clearing page state", previous, current);
                state.reset();
            }
        }
        state.base_url = Some(current);
    }

    fn initialize(&self, state: &mut PageState) {
        if state.tracker.is_loaded() {
            return;
        }
        let base = self.current_base();
        let count = state
            .tracker
            .seed_initial(visible_fingerprints(self.dom.as_ref()), &base);
        info!("Captured {} initially visible elements on {}", count, base);

        let episode = state.episode;
        let dom = Arc::clone(&self.dom);
        let shared = Arc::clone(&self.state);
        let delay = self.config.settle_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let visible = visible_fingerprints(dom.as_ref());
            let mut state = shared.lock();
            if state.episode != episode {
                debug!("Settle scan from episode {} skipped", episode);
                return;
            }
            let added = state.tracker.fold_late(visible, &base);
            if added > 0 {
                debug!("Folded {} late-loading elements into the initial set", added);
            }
        });
    }

    /// Record the action and schedule the post-interaction rescan.
    fn track_interaction(&self, state: &mut PageState, kind: MessageKind, snapshot: &ElementSnapshot) {
        if !state.tracker.is_loaded() {
            return;
        }
        let trigger = snapshot.trigger();
        state.tracker.record_action(kind, trigger.clone());

        let episode = state.episode;
        let dom = Arc::clone(&self.dom);
        let shared = Arc::clone(&self.state);
        let delay = self.config.rescan_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let visible = visible_fingerprints(dom.as_ref());
            let mut state = shared.lock();
            if state.episode != episode {
                debug!("Rescan from episode {} skipped", episode);
                return;
            }
            let added = state.tracker.attribute_new(visible, &trigger);
            if added > 0 {
                debug!("{} elements revealed by {}", added, trigger.fingerprint);
            }
        });
    }

    fn snapshot_of(&self, state: &mut PageState, node: NodeId) -> Option<ElementSnapshot> {
        let dom = self.dom.as_ref();
        let fp = fingerprint(dom, node)?;
        let provenance = state
            .tracker
            .resolve(&fp, is_visible(dom, node), &self.current_base());
        SnapshotBuilder::new(dom).snapshot(node, provenance)
    }

    /// Live value, else the element's form value, else empty.
    fn typed_value(&self, snapshot: &ElementSnapshot, node: NodeId) -> String {
        snapshot
            .typed_value()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| self.dom.value(node))
            .unwrap_or_default()
    }

    /// Admit through the critical ledger and schedule the attempts.
    fn send_critical(&self, state: &mut PageState, report: InteractionReport) -> bool {
        let key = CriticalLedger::dedupe_key(report.content, &report.details.fingerprint);
        if !state.critical.admit(&key, Instant::now()) {
            debug!("Critical event {} deduplicated", key);
            return false;
        }
        self.dispatcher.send_attempts(report);
        true
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
