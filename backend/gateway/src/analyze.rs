//! Analyze endpoints.
//!
//! `POST /analyze` takes a multipart upload, `POST /api/analyze` a base64 JSON
//! body or a raw image body. Both hand an `ImageInput` to the shared analyzer.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Query, State},
    http::{HeaderMap, header::CONTENT_TYPE},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use signvision_core::{CoordinateScale, Detection, DetectionBatch, DetectionColor, ImageInput};
use tracing::{Instrument, debug, info_span};
use uuid::Uuid;

use crate::error::ApiError;
use crate::mime::resolve_image_mime;
use crate::state::GatewayState;

/// `?scale=unit|percent`
#[derive(Debug, Default, Deserialize)]
pub struct ScaleQuery {
    pub scale: Option<String>,
}

/// JSON body for `POST /api/analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 image, optionally as a `data:` URI.
    pub image: String,
    #[serde(default, alias = "mime_type")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub scale: Option<String>,
}

fn parse_scale(raw: Option<&str>) -> Result<Option<CoordinateScale>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(ApiError::from),
    }
}

/// Decode a base64 image field, returning the MIME type a `data:` URI declares.
fn decode_image_field(field: &str) -> Result<(Bytes, Option<String>), ApiError> {
    let (declared, payload) = match field.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| ApiError::bad_request("malformed data URI"))?;
            let mime = header.split(';').next().unwrap_or_default().trim();
            ((!mime.is_empty()).then(|| mime.to_string()), payload)
        }
        None => (None, field),
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ApiError::bad_request(format!("image is not valid base64: {e}")))?;
    Ok((Bytes::from(bytes), declared))
}

async fn run(
    state: &GatewayState,
    image: ImageInput,
    scale: Option<CoordinateScale>,
) -> Result<Json<DetectionBatch>, ApiError> {
    let analyzer = state.analyzer()?;
    let span = info_span!("analyze", request_id = %Uuid::new_v4());
    let batch = analyzer.analyze(image, scale).instrument(span).await?;
    Ok(Json(batch))
}

/// Handler for `POST /analyze`.
pub async fn analyze_upload(
    State(state): State<GatewayState>,
    Query(query): Query<ScaleQuery>,
    mut multipart: Multipart,
) -> Result<Json<DetectionBatch>, ApiError> {
    let mut image: Option<ImageInput> = None;
    let mut form_scale: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let declared = field.content_type().map(str::to_owned);
                let file_name = field.file_name().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read upload: {e}")))?;
                let mime = resolve_image_mime(declared.as_deref(), file_name.as_deref(), &bytes);
                debug!(bytes = bytes.len(), mime = %mime, file_name = ?file_name, "Received upload");
                image = Some(ImageInput::new(bytes, mime));
            }
            "scale" => {
                form_scale = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::bad_request(format!("failed to read scale: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let image = image.ok_or_else(|| ApiError::bad_request("missing multipart field 'file'"))?;
    let scale = parse_scale(form_scale.as_deref().or(query.scale.as_deref()))?;
    run(&state, image, scale).await
}

fn json_image(
    request: AnalyzeRequest,
    query: &ScaleQuery,
) -> Result<(ImageInput, Option<CoordinateScale>), ApiError> {
    let (bytes, uri_mime) = decode_image_field(&request.image)?;
    let declared = request.content_type.as_deref().or(uri_mime.as_deref());
    let mime = resolve_image_mime(declared, None, &bytes);
    let scale = parse_scale(request.scale.as_deref().or(query.scale.as_deref()))?;
    Ok((ImageInput::new(bytes, mime), scale))
}

/// Handler for `POST /api/analyze`.
///
/// Takes a JSON body with a base64 `image`, or the raw image bytes. Bodies
/// that parse as the JSON request are treated as JSON whatever their
/// content type; anything else is sniffed as an image.
pub async fn analyze_image(
    State(state): State<GatewayState>,
    Query(query): Query<ScaleQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DetectionBatch>, ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
        .unwrap_or_default();

    let (image, scale) = if content_type == "application/json" || content_type.ends_with("+json") {
        let request: AnalyzeRequest = serde_json::from_slice(&body)
            .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;
        json_image(request, &query)?
    } else if let Ok(request) = serde_json::from_slice::<AnalyzeRequest>(&body) {
        json_image(request, &query)?
    } else {
        let declared = (!content_type.is_empty()).then_some(content_type.as_str());
        let mime = resolve_image_mime(declared, None, &body);
        (ImageInput::new(body, mime), parse_scale(query.scale.as_deref())?)
    };

    run(&state, image, scale).await
}

/// Handler for `POST /analyze-fallback`: a fixed response for front-end smoke tests.
pub async fn analyze_fallback() -> Json<DetectionBatch> {
    Json(DetectionBatch::new(
        vec![Detection::new(
            "scene_analyzed",
            [0.25, 0.25, 0.5, 0.5],
            DetectionColor::Blue,
            1.0,
        )],
        100.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_parsing() {
        assert_eq!(parse_scale(None).unwrap(), None);
        assert_eq!(parse_scale(Some("  ")).unwrap(), None);
        assert_eq!(parse_scale(Some("percent")).unwrap(), Some(CoordinateScale::Percent));
        assert!(parse_scale(Some("pixels")).is_err());
    }

    #[test]
    fn decodes_data_uri() {
        let (bytes, mime) = decode_image_field("data:image/png;base64,iVBO\nRw==").unwrap();
        assert_eq!(mime.as_deref(), Some("image/png"));
        assert_eq!(&bytes[..], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn rejects_bad_base64() {
        let err = decode_image_field("not base64!!").unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
