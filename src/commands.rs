//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use steptrail_config::Config;
use steptrail_protocols::{
    CaptureError, Credentials, InteractionReport, Screenshot, ScreenshotCapturer,
};
use steptrail_recorder::{
    HttpSessionTransport, KeyDerivation, MemoryCredentialStore, RecordOutcome, SessionRecorder,
    SessionSaver,
};
use tracing::{info, warn};

use crate::simulate::Simulation;

/// Capturer for runs without a browser tab.
struct UnavailableCapturer;

#[async_trait]
impl ScreenshotCapturer for UnavailableCapturer {
    async fn capture(&self, step_id: u64, _x: f64, _y: f64) -> Result<Screenshot, CaptureError> {
        Err(CaptureError::Unavailable(format!(
            "no browser attached for step {}",
            step_id
        )))
    }
}

fn recording() -> Arc<SessionRecorder> {
    let recorder = Arc::new(SessionRecorder::new(Arc::new(UnavailableCapturer)));
    recorder.start();
    recorder
}

/// Parse a JSON-lines reports file. Blank lines are skipped.
pub(crate) fn parse_reports(content: &str) -> anyhow::Result<Vec<InteractionReport>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid report on line {}", index + 1))
        })
        .collect()
}

fn replay_into(recorder: &SessionRecorder, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let reports = parse_reports(&content)?;

    let mut appended = 0;
    for report in reports {
        if let RecordOutcome::Appended { .. } = recorder.handle(report) {
            appended += 1;
        }
    }
    info!("Replayed {} into {} new steps", path.display(), appended);
    Ok(())
}

pub(crate) async fn replay(path: &Path) -> anyhow::Result<()> {
    let recorder = recording();
    replay_into(&recorder, path)?;
    println!("{}", recorder.session_json()?);
    Ok(())
}

pub(crate) async fn simulate(config: &Config, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let simulation = Simulation::from_json(&content)?;

    let recorder = recording();
    let ran = simulation.run(recorder.clone(), config.observer.clone()).await?;
    info!("Simulated {} script steps, recorded {}", ran, recorder.steps().len());
    println!("{}", recorder.session_json()?);
    Ok(())
}

pub(crate) fn seal(config: &Config, token: &str, path: &Path) -> anyhow::Result<()> {
    let plaintext = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let key = KeyDerivation::from_config(&config.envelope).derive(token);
    println!("{}", key.seal(&plaintext)?);
    Ok(())
}

pub(crate) fn open(config: &Config, token: &str, path: &Path) -> anyhow::Result<()> {
    let envelope = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let key = KeyDerivation::from_config(&config.envelope).derive(token);
    let opened = key.open(envelope.trim()).context("Envelope rejected")?;
    info!("Envelope sealed at {}", opened.timestamp);
    println!("{}", String::from_utf8_lossy(&opened.plaintext));
    Ok(())
}

pub(crate) async fn save(
    config: &Config,
    name: &str,
    token: String,
    refresh_token: Option<String>,
    path: &Path,
) -> anyhow::Result<()> {
    let recorder = recording();
    replay_into(&recorder, path)?;

    let transport = HttpSessionTransport::new(config.transport.clone())?;
    let credentials = MemoryCredentialStore::new(Some(Credentials::new(token, refresh_token)));
    let saver = SessionSaver::new(
        Arc::new(transport),
        Arc::new(credentials),
        KeyDerivation::from_config(&config.envelope),
    );

    let report = saver
        .save(name, &recorder.entries(), &recorder.screenshots())
        .await?;
    if report.images_failed > 0 {
        warn!("{} screenshot uploads failed", report.images_failed);
    }
    println!(
        "Saved '{}' as session {} ({} images)",
        report.session_name, report.session_id, report.images_uploaded
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use steptrail_protocols::MessageKind;

    const REPORT: &str = r#"{"content":"clicked","details":{"fingerprint":"/html/body/a","tag_name":"a","left":0.0,"top":0.0,"width":10.0,"height":10.0,"x":5.0,"y":5.0,"visible_from":{"origin":"page","context":"https://example.com/"},"data":{"tag_name":"a"}},"url":"https://example.com/"}"#;

    #[test]
    fn test_parse_reports_skips_blank_lines() {
        let content = format!("{}\n\n{}\n", REPORT, REPORT);
        let reports = parse_reports(&content).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].content, MessageKind::Clicked);
    }

    #[test]
    fn test_parse_reports_names_bad_line() {
        let content = format!("{}\nnot json\n", REPORT);
        let err = parse_reports(&content).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[tokio::test]
    async fn test_replay_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.jsonl");
        std::fs::write(&path, format!("{}\n{}\n", REPORT, REPORT)).unwrap();

        let recorder = recording();
        replay_into(&recorder, &path).unwrap();
        // navigate seed plus one click; the repeat is a duplicate
        assert_eq!(recorder.steps().len(), 2);
    }
}
