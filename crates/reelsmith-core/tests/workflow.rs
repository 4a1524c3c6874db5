use std::sync::Arc;
use std::time::Duration;

use reelsmith_core::{
    ExtractError, GeneratedVideo, GenerationDraft, OperationFailure, OperationPayload, PollError,
    PollPolicy, PollResult, SubmissionError, WorkflowError,
};
use reelsmith_test_support::fakes::{
    FailingCredentials, RecordingPublisher, ScriptedGenerator, StaticCredentials,
};
use reelsmith_test_support::fixtures::{
    OPERATION_NAME, SAMPLE_MP4, TEST_TOKEN, filtered_payload, mp4_payload, payload_with_video,
};
use reelsmith_test_support::harness::WorkflowHarness;

fn seconds(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}

#[tokio::test]
async fn cat_surfing_prompt_publishes_after_three_checks() -> anyhow::Result<()> {
    let harness =
        WorkflowHarness::new(ScriptedGenerator::pending_then(2, PollResult::Done(mp4_payload())))?;

    let asset = harness
        .workflow
        .generate(GenerationDraft::with_prompt("a cat surfing"))
        .await?;

    assert!(asset.secure_url.starts_with("https://"));
    assert!(asset.secure_url.contains("/video/upload/"));
    assert_eq!(harness.generator.poll_count(), 3);
    assert_eq!(harness.sleeper.waits(), seconds(&[2, 4]));

    let submissions = harness.generator.submissions();
    assert_eq!(submissions.len(), 1);
    let (request, token) = &submissions[0];
    assert_eq!(request.prompt(), "a cat surfing");
    assert_eq!(request.aspect_ratio(), "16:9");
    assert_eq!(request.duration_seconds(), 4);
    assert_eq!(token, TEST_TOKEN);

    let uploads = harness.publisher.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bytes, SAMPLE_MP4);
    let name = uploads[0]
        .path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    assert!(name.starts_with("video_") && name.ends_with(".mp4"), "{name}");

    assert!(harness.staged_files()?.is_empty());
    assert_eq!(harness.metrics.workflow_count("success"), 1);
    assert_eq!(harness.metrics.snapshot().in_flight, 0);
    Ok(())
}

#[tokio::test]
async fn every_check_reuses_the_submitted_handle_and_token() -> anyhow::Result<()> {
    let credentials = Arc::new(StaticCredentials::new());
    let harness =
        WorkflowHarness::builder(ScriptedGenerator::pending_then(3, PollResult::Done(mp4_payload())))
            .credentials(credentials.clone())
            .build()?;
    harness
        .workflow
        .generate(GenerationDraft::with_prompt("a lighthouse in fog"))
        .await?;

    let polls = harness.generator.polls();
    assert_eq!(polls.len(), 4);
    for (handle, token) in polls {
        assert_eq!(handle.as_str(), OPERATION_NAME);
        assert_eq!(token, TEST_TOKEN);
    }
    assert_eq!(credentials.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn always_pending_times_out_after_budget_without_trailing_wait() -> anyhow::Result<()> {
    let harness = WorkflowHarness::new(ScriptedGenerator::always_pending())?;

    let Err(error) = harness
        .workflow
        .generate(GenerationDraft::with_prompt("a slow sunset"))
        .await
    else {
        panic!("expected timeout");
    };

    assert!(matches!(error, WorkflowError::TimedOut { attempts: 15, .. }));
    assert_eq!(harness.generator.poll_count(), 15);
    let waits = harness.sleeper.waits();
    assert_eq!(waits, seconds(&[2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 22, 24, 26, 28]));
    assert_eq!(waits.iter().sum::<Duration>(), Duration::from_secs(210));
    assert!(harness.publisher.uploads().is_empty());
    assert_eq!(harness.metrics.workflow_count("timed_out"), 1);
    Ok(())
}

#[tokio::test]
async fn shorter_policy_shortens_the_schedule() -> anyhow::Result<()> {
    let harness = WorkflowHarness::builder(ScriptedGenerator::always_pending())
        .policy(PollPolicy::new(Duration::from_millis(10), 3))
        .build()?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    assert!(matches!(result, Err(WorkflowError::TimedOut { attempts: 3, .. })));
    assert_eq!(
        harness.sleeper.waits(),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );
    Ok(())
}

#[tokio::test]
async fn missing_prompt_fails_before_any_collaborator_runs() -> anyhow::Result<()> {
    let harness = WorkflowHarness::new(ScriptedGenerator::always_pending())?;

    let result = harness.workflow.generate(GenerationDraft::default()).await;

    let Err(error) = result else {
        panic!("expected validation error");
    };
    assert!(error.is_client_error());
    assert_eq!(error.to_string(), "Missing 'prompt' in request body.");
    assert!(harness.generator.submissions().is_empty());
    assert_eq!(harness.generator.poll_count(), 0);
    assert_eq!(harness.metrics.workflow_count("validation_error"), 1);
    Ok(())
}

#[tokio::test]
async fn operation_error_stops_polling_immediately() -> anyhow::Result<()> {
    let generator = ScriptedGenerator::new([
        Ok(PollResult::Pending),
        Ok(PollResult::Failed(OperationFailure {
            code: Some(3),
            message: "prompt violates policy".into(),
        })),
        Ok(PollResult::Done(mp4_payload())),
    ]);
    let harness = WorkflowHarness::new(generator)?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    let Err(WorkflowError::Poll { attempt, source, .. }) = result else {
        panic!("expected poll error");
    };
    assert_eq!(attempt, 2);
    assert!(matches!(source, PollError::Operation { code: Some(3), .. }));
    assert_eq!(harness.generator.poll_count(), 2);
    assert!(harness.publisher.uploads().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_status_is_fatal_not_pending() -> anyhow::Result<()> {
    let generator = ScriptedGenerator::new([Err(PollError::Malformed {
        detail: "expected value at line 1 column 1".into(),
    })]);
    let harness = WorkflowHarness::new(generator)?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    assert!(matches!(result, Err(WorkflowError::Poll { attempt: 1, .. })));
    assert_eq!(harness.generator.poll_count(), 1);
    assert!(harness.sleeper.waits().is_empty());
    Ok(())
}

#[tokio::test]
async fn submission_failure_skips_polling() -> anyhow::Result<()> {
    let generator = ScriptedGenerator::always_pending()
        .failing_submit(SubmissionError::MissingOperationName);
    let harness = WorkflowHarness::new(generator)?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    assert!(matches!(result, Err(WorkflowError::Submission { .. })));
    assert_eq!(harness.generator.poll_count(), 0);
    Ok(())
}

#[tokio::test]
async fn credential_failure_skips_submission() -> anyhow::Result<()> {
    let harness = WorkflowHarness::builder(ScriptedGenerator::always_pending())
        .credentials(Arc::new(FailingCredentials))
        .build()?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    assert!(matches!(result, Err(WorkflowError::Credential { .. })));
    assert!(harness.generator.submissions().is_empty());
    Ok(())
}

#[tokio::test]
async fn filtered_output_is_a_missing_asset() -> anyhow::Result<()> {
    let harness = WorkflowHarness::new(ScriptedGenerator::pending_then(
        0,
        PollResult::Done(filtered_payload("sensitive content")),
    ))?;

    let Err(error) = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await
    else {
        panic!("expected missing asset");
    };

    assert_eq!(error.kind(), "missing_asset");
    assert!(error.detail().contains("no video found in response"));
    assert!(error.detail().contains("sensitive content"));
    assert!(harness.staged_files()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_upload_still_releases_staged_file() -> anyhow::Result<()> {
    let harness =
        WorkflowHarness::builder(ScriptedGenerator::pending_then(1, PollResult::Done(mp4_payload())))
            .publisher(RecordingPublisher::failing(502))
            .build()?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    assert!(matches!(result, Err(WorkflowError::Publish { .. })));
    assert_eq!(harness.publisher.uploads().len(), 1);
    assert!(harness.staged_files()?.is_empty());
    assert_eq!(harness.metrics.snapshot().release_failures_total, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_workflows_stage_distinct_files() -> anyhow::Result<()> {
    let harness = WorkflowHarness::new(ScriptedGenerator::new([
        Ok(PollResult::Done(mp4_payload())),
        Ok(PollResult::Done(mp4_payload())),
    ]))?;

    let first = harness.workflow.clone();
    let second = harness.workflow.clone();
    let (a, b) = tokio::join!(
        first.generate(GenerationDraft::with_prompt("one")),
        second.generate(GenerationDraft::with_prompt("two")),
    );

    let (a, b) = (a?, b?);
    assert_ne!(a.secure_url, b.secure_url);
    let uploads = harness.publisher.uploads();
    assert_eq!(uploads.len(), 2);
    assert_ne!(uploads[0].path, uploads[1].path);
    assert!(harness.staged_files()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unwritable_staging_dir_fails_before_upload() -> anyhow::Result<()> {
    let harness =
        WorkflowHarness::new(ScriptedGenerator::pending_then(0, PollResult::Done(mp4_payload())))?;
    std::fs::write(harness.staging_dir(), b"not a directory")?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    let Err(error) = result else {
        panic!("expected staging failure");
    };
    assert!(matches!(error, WorkflowError::Staging { .. }));
    assert_eq!(error.kind(), "staging_error");
    assert!(harness.publisher.uploads().is_empty());
    assert_eq!(harness.metrics.workflow_count("staging_error"), 1);
    Ok(())
}

#[tokio::test]
async fn zero_byte_video_is_a_missing_asset() -> anyhow::Result<()> {
    let harness = WorkflowHarness::new(ScriptedGenerator::pending_then(
        0,
        PollResult::Done(payload_with_video(GeneratedVideo {
            bytes_base64_encoded: Some(String::new()),
            mime_type: Some("video/mp4".into()),
            gcs_uri: None,
        })),
    ))?;

    let result = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await;

    assert!(matches!(
        result,
        Err(WorkflowError::MissingAsset {
            source: ExtractError::Empty,
            ..
        })
    ));
    assert!(harness.publisher.uploads().is_empty());
    assert!(harness.staged_files()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn done_without_response_is_a_missing_asset() -> anyhow::Result<()> {
    let harness = WorkflowHarness::new(ScriptedGenerator::pending_then(
        1,
        PollResult::Done(OperationPayload::default()),
    ))?;

    let Err(error) = harness
        .workflow
        .generate(GenerationDraft::with_prompt("p"))
        .await
    else {
        panic!("expected missing asset");
    };

    assert!(matches!(
        error,
        WorkflowError::MissingAsset {
            source: ExtractError::Absent { .. },
            ..
        }
    ));
    assert_eq!(error.kind(), "missing_asset");
    assert_eq!(harness.generator.poll_count(), 2);
    assert!(harness.publisher.uploads().is_empty());
    Ok(())
}
