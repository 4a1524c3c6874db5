//! Sample payloads shared by integration suites.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reelsmith_core::{GeneratedVideo, GenerationResponse, OperationPayload, UploadOptions};

/// Operation name returned by scripted generators.
pub const OPERATION_NAME: &str =
    "projects/demo/locations/us-central1/publishers/google/models/veo-2.0-generate-001/operations/0042";

/// Access token issued by static fake credentials.
pub const TEST_TOKEN: &str = "ya29.test-token";

/// Minimal MP4 header: an `ftyp` box with the `isom` brand followed by an empty `mdat`.
pub const SAMPLE_MP4: &[u8] = &[
    0x00, 0x00, 0x00, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm', 0x00, 0x00, 0x02,
    0x00, b'i', b's', b'o', b'm', b'm', b'p', b'4', b'1', 0x00, 0x00, 0x00, 0x08, b'm', b'd',
    b'a', b't',
];

/// [`SAMPLE_MP4`] encoded as base64.
#[must_use]
pub fn sample_mp4_base64() -> String {
    STANDARD.encode(SAMPLE_MP4)
}

/// Terminal payload carrying [`SAMPLE_MP4`].
#[must_use]
pub fn mp4_payload() -> OperationPayload {
    payload_with_video(GeneratedVideo {
        bytes_base64_encoded: Some(sample_mp4_base64()),
        mime_type: Some("video/mp4".to_string()),
        gcs_uri: None,
    })
}

/// Terminal payload with a single video entry.
#[must_use]
pub fn payload_with_video(video: GeneratedVideo) -> OperationPayload {
    OperationPayload {
        response: Some(GenerationResponse {
            videos: vec![video],
            ..GenerationResponse::default()
        }),
    }
}

/// Terminal payload where the content filter removed every video.
#[must_use]
pub fn filtered_payload(reason: &str) -> OperationPayload {
    OperationPayload {
        response: Some(GenerationResponse {
            videos: Vec::new(),
            rai_media_filtered_count: Some(1),
            rai_media_filtered_reasons: vec![reason.to_string()],
        }),
    }
}

/// Upload options matching the service defaults.
#[must_use]
pub fn upload_options() -> UploadOptions {
    UploadOptions {
        resource_type: "video".to_string(),
        folder: "veo2_generated_videos".to_string(),
    }
}
