//! Scripted page simulation: a DOM fixture plus the events a user performs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use steptrail_config::ObserverConfig;
use steptrail_observer::{
    DomFixture, InputEvent, KeyEvent, MemoryDom, NodeId, PageDom, PageObserver, PointerEvent,
    PointerKind, SubmitEvent,
};
use steptrail_protocols::{NavigationMethod, ReportSink};
use tracing::debug;

/// A page and the user script to run against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Simulation {
    pub page: DomFixture,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

/// One user or page action. Targets are fixture node keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum ScriptStep {
    Click { target: String },
    Type { target: String, value: String },
    Enter { target: String },
    Submit { form: String },
    History { method: NavigationMethod },
    Navigate { url: String },
    Show { target: String },
    Wait { ms: u64 },
}

impl Simulation {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Invalid simulation file")
    }

    /// Run the script; reports go to `sink`. Returns the number of steps run.
    pub async fn run(&self, sink: Arc<dyn ReportSink>, config: ObserverConfig) -> anyhow::Result<usize> {
        let (dom, nodes) = MemoryDom::from_fixture(&self.page);
        let dom = Arc::new(dom);
        let drain = config.settle_delay() + config.rescan_delay() + Duration::from_millis(50);
        let observer = PageObserver::new(dom.clone(), sink, config);
        observer.start();

        for step in &self.script {
            debug!("Simulating {:?}", step);
            match step {
                ScriptStep::Click { target } => {
                    let node = lookup(&nodes, target)?;
                    let (x, y) = dom.rect(node).center();
                    observer.on_pointer(PointerEvent::new(PointerKind::MouseDown, node, x, y));
                    dom.focus(Some(node));
                    observer.on_pointer(PointerEvent::new(PointerKind::Click, node, x, y));
                }
                ScriptStep::Type { target, value } => {
                    let node = lookup(&nodes, target)?;
                    dom.focus(Some(node));
                    dom.set_value(node, value.clone());
                    observer.on_input(InputEvent {
                        target: node,
                        is_user_input: true,
                    });
                }
                ScriptStep::Enter { target } => {
                    let node = lookup(&nodes, target)?;
                    dom.focus(Some(node));
                    observer.on_keydown(&KeyEvent::enter(Some(node)));
                }
                ScriptStep::Submit { form } => {
                    let form = lookup(&nodes, form)?;
                    observer.on_submit(SubmitEvent { form });
                }
                ScriptStep::History { method } => {
                    observer.on_history(*method);
                }
                ScriptStep::Navigate { url } => {
                    dom.set_location(url.clone());
                    observer.on_location_mutation();
                }
                ScriptStep::Show { target } => dom.show(lookup(&nodes, target)?),
                ScriptStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
            }
        }

        // let pending deliveries and timers land
        tokio::time::sleep(drain).await;
        Ok(self.script.len())
    }
}

fn lookup(nodes: &HashMap<String, NodeId>, key: &str) -> anyhow::Result<NodeId> {
    nodes
        .get(key)
        .copied()
        .with_context(|| format!("Unknown node key '{}'", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use steptrail_protocols::{CaptureError, Screenshot, ScreenshotCapturer};
    use steptrail_recorder::{ActionKind, SessionRecorder};

    struct NoCapture;

    #[async_trait::async_trait]
    impl ScreenshotCapturer for NoCapture {
        async fn capture(&self, _: u64, _: f64, _: f64) -> Result<Screenshot, CaptureError> {
            Err(CaptureError::Unavailable("test".to_string()))
        }
    }

    const SIMULATION: &str = r#"{
        "page": {
            "url": "https://docs.example.com/guide",
            "viewport": { "width": 1280.0, "height": 720.0 },
            "root": {
                "tag": "html",
                "rect": { "left": 0.0, "top": 0.0, "width": 1280.0, "height": 2000.0 },
                "children": [{
                    "tag": "body",
                    "rect": { "left": 0.0, "top": 0.0, "width": 1280.0, "height": 2000.0 },
                    "children": [{
                        "tag": "form",
                        "key": "form",
                        "rect": { "left": 0.0, "top": 100.0, "width": 600.0, "height": 60.0 },
                        "children": [
                            {
                                "tag": "input",
                                "key": "query",
                                "attributes": { "name": "q", "placeholder": "Search" },
                                "rect": { "left": 10.0, "top": 110.0, "width": 400.0, "height": 40.0 }
                            },
                            {
                                "tag": "button",
                                "key": "go",
                                "text": "Go",
                                "rect": { "left": 420.0, "top": 110.0, "width": 100.0, "height": 40.0 }
                            }
                        ]
                    }]
                }]
            }
        },
        "script": [
            { "action": "type", "target": "query", "value": "r" },
            { "action": "wait", "ms": 20 },
            { "action": "type", "target": "query", "value": "rust" },
            { "action": "wait", "ms": 20 },
            { "action": "enter", "target": "query" },
            { "action": "submit", "form": "form" },
            { "action": "wait", "ms": 400 },
            { "action": "click", "target": "go" }
        ]
    }"#;

    #[tokio::test]
    async fn test_simulation_records_session() {
        let simulation = Simulation::from_json(SIMULATION).unwrap();
        let recorder = Arc::new(SessionRecorder::new(Arc::new(NoCapture)));
        recorder.start();

        let ran = simulation
            .run(recorder.clone(), ObserverConfig::default())
            .await
            .unwrap();
        assert_eq!(ran, 8);

        let kinds: Vec<ActionKind> = recorder.steps().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::Navigate, ActionKind::Typed, ActionKind::Enter, ActionKind::Click]
        );
        assert_eq!(recorder.steps()[1].input.as_deref(), Some("rust"));
    }

    #[tokio::test]
    async fn test_unknown_key_is_an_error() {
        let mut simulation = Simulation::from_json(SIMULATION).unwrap();
        simulation.script = vec![ScriptStep::Show {
            target: "missing".to_string(),
        }];
        let recorder = Arc::new(SessionRecorder::new(Arc::new(NoCapture)));
        let err = simulation
            .run(recorder, ObserverConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
