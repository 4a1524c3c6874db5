use std::time::Duration;

use httpmock::prelude::*;
use reelsmith_config::{CloudinaryConfig, Secret, SignatureAlgorithm};
use reelsmith_core::{PublishError, StoragePublisher};
use reelsmith_providers::{CloudinaryPublisher, build_client};
use reelsmith_test_support::fixtures::{SAMPLE_MP4, upload_options};
use serde_json::json;
use tempfile::TempDir;

fn publisher_for(
    server: &MockServer,
    algorithm: SignatureAlgorithm,
) -> anyhow::Result<CloudinaryPublisher> {
    let config = CloudinaryConfig {
        cloud_name: "demo".to_string(),
        api_key: "123456".to_string(),
        api_secret: Secret::new("shh".to_string()),
        base_url: server.base_url(),
        folder: "veo2_generated_videos".to_string(),
        resource_type: "video".to_string(),
        signature_algorithm: algorithm,
    };
    Ok(CloudinaryPublisher::new(
        build_client(Duration::from_secs(5))?,
        &config,
    ))
}

fn staged_file(dir: &TempDir) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.path().join("video_test.mp4");
    std::fs::write(&path, SAMPLE_MP4)?;
    Ok(path)
}

#[tokio::test]
async fn upload_sends_signed_multipart_and_returns_secure_url() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1_1/demo/video/upload")
            .body_includes("name=\"api_key\"")
            .body_includes("123456")
            .body_includes("name=\"signature\"")
            .body_includes("name=\"folder\"")
            .body_includes("veo2_generated_videos")
            .body_includes("filename=\"video_test.mp4\"")
            .body_includes("ftypisom");
        then.status(200).json_body(json!({
            "public_id": "veo2_generated_videos/video_test",
            "secure_url": "https://res.cloudinary.com/demo/video/upload/v1/veo2_generated_videos/video_test.mp4"
        }));
    });

    let temp = TempDir::new()?;
    let path = staged_file(&temp)?;
    let asset = publisher_for(&server, SignatureAlgorithm::Sha1)?
        .upload(&path, &upload_options())
        .await?;

    mock.assert();
    assert_eq!(
        asset.secure_url,
        "https://res.cloudinary.com/demo/video/upload/v1/veo2_generated_videos/video_test.mp4"
    );
    assert_eq!(
        asset.public_id.as_deref(),
        Some("veo2_generated_videos/video_test")
    );
    Ok(())
}

#[tokio::test]
async fn sha256_uploads_declare_the_algorithm() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1_1/demo/video/upload")
            .body_includes("name=\"signature_algorithm\"")
            .body_includes("sha256");
        then.status(200)
            .json_body(json!({ "secure_url": "https://res.cloudinary.com/demo/video/upload/x.mp4" }));
    });

    let temp = TempDir::new()?;
    let path = staged_file(&temp)?;
    publisher_for(&server, SignatureAlgorithm::Sha256)?
        .upload(&path, &upload_options())
        .await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn rejected_upload_reports_status_and_message() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/v1_1/demo/video/upload");
        then.status(401)
            .json_body(json!({ "error": { "message": "Invalid Signature" } }));
    });

    let temp = TempDir::new()?;
    let path = staged_file(&temp)?;
    let result = publisher_for(&server, SignatureAlgorithm::Sha1)?
        .upload(&path, &upload_options())
        .await;

    let Err(PublishError::Status { status, message }) = result else {
        panic!("expected status error");
    };
    assert_eq!(status, 401);
    assert_eq!(message.as_deref(), Some("Invalid Signature"));
    Ok(())
}

#[tokio::test]
async fn response_without_secure_url_is_malformed() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST).path("/v1_1/demo/video/upload");
        then.status(200).json_body(json!({ "public_id": "x" }));
    });

    let temp = TempDir::new()?;
    let path = staged_file(&temp)?;
    let result = publisher_for(&server, SignatureAlgorithm::Sha1)?
        .upload(&path, &upload_options())
        .await;
    assert!(matches!(result, Err(PublishError::Malformed { .. })));
    Ok(())
}

#[tokio::test]
async fn missing_file_fails_before_any_request() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200);
    });

    let temp = TempDir::new()?;
    let result = publisher_for(&server, SignatureAlgorithm::Sha1)?
        .upload(&temp.path().join("absent.mp4"), &upload_options())
        .await;
    assert!(matches!(result, Err(PublishError::Io { .. })));
    mock.assert_hits(0);
    Ok(())
}
