//! Decoding of the binary asset embedded in a terminal payload.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::ExtractError;
use crate::model::{GeneratedAsset, MediaType, OperationPayload};

/// Pull the first generated clip out of `payload` and decode it.
///
/// The clip must be present at `response.videos[0].bytesBase64Encoded` and
/// decode to a non-empty byte sequence. The media type comes from the declared
/// MIME type when present, otherwise from the leading bytes.
///
/// # Errors
///
/// Returns [`ExtractError::Absent`] when the field is missing,
/// [`ExtractError::Empty`] when it holds no data, and [`ExtractError::Decode`]
/// when it is not valid base64.
pub fn extract_asset(payload: &OperationPayload) -> Result<GeneratedAsset, ExtractError> {
    let response = payload.response.as_ref();
    let video = response.and_then(|response| response.videos.first());
    let Some(encoded) = video.and_then(|video| video.bytes_base64_encoded.as_deref()) else {
        return Err(ExtractError::Absent {
            gcs_uri: video.and_then(|video| video.gcs_uri.clone()),
            filtered_count: response.and_then(|response| response.rai_media_filtered_count),
            filtered_reasons: response
                .map(|response| response.rai_media_filtered_reasons.clone())
                .unwrap_or_default(),
        });
    };

    let bytes = decode_base64(encoded)?;
    if bytes.is_empty() {
        return Err(ExtractError::Empty);
    }

    let media_type = video
        .and_then(|video| video.mime_type.as_deref())
        .filter(|mime| !mime.trim().is_empty())
        .map_or_else(|| MediaType::sniff(&bytes), MediaType::from_mime);

    Ok(GeneratedAsset { bytes, media_type })
}

/// Decode `encoded`, retrying without whitespace when it arrives line-wrapped.
fn decode_base64(encoded: &str) -> Result<Vec<u8>, ExtractError> {
    match STANDARD.decode(encoded) {
        Ok(bytes) => Ok(bytes),
        Err(first) => {
            let compact: String = encoded
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            if compact.len() == encoded.len() {
                return Err(ExtractError::Decode { source: first });
            }
            if compact.is_empty() {
                return Err(ExtractError::Empty);
            }
            STANDARD
                .decode(compact.as_bytes())
                .map_err(|source| ExtractError::Decode { source })
        }
    }
}
