use std::io;
use std::sync::{Arc, Mutex};

use reelsmith_core::{GenerationDraft, PollResult};
use reelsmith_telemetry::RequestScope;
use reelsmith_test_support::fakes::ScriptedGenerator;
use reelsmith_test_support::fixtures::mp4_payload;
use reelsmith_test_support::harness::WorkflowHarness;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> anyhow::Result<String> {
        let bytes = self
            .0
            .lock()
            .map_err(|_| anyhow::anyhow!("log buffer poisoned"))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::other("log buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn workflow_logs_carry_the_originating_request() -> anyhow::Result<()> {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    let _default = tracing::subscriber::set_default(subscriber);

    let harness =
        WorkflowHarness::new(ScriptedGenerator::pending_then(0, PollResult::Done(mp4_payload())))?;
    RequestScope::new("req-77", "/generate")
        .run(
            harness
                .workflow
                .generate(GenerationDraft::with_prompt("a fox at dawn")),
        )
        .await?;

    let text = logs.text()?;
    let published = text
        .lines()
        .find(|line| line.contains("video published"))
        .unwrap_or_default();
    assert!(published.contains("generation_workflow"), "{text}");
    assert!(published.contains("request_id"), "{text}");
    assert!(published.contains("req-77"), "{text}");
    assert!(published.contains("/generate"), "{text}");
    Ok(())
}

#[tokio::test]
async fn workflow_without_request_scope_still_runs() -> anyhow::Result<()> {
    let harness =
        WorkflowHarness::new(ScriptedGenerator::pending_then(0, PollResult::Done(mp4_payload())))?;
    let asset = harness
        .workflow
        .generate(GenerationDraft::with_prompt("a fox at dusk"))
        .await?;
    assert!(asset.secure_url.starts_with("https://"));
    Ok(())
}
