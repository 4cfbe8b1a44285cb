use super::AppState;
use crate::claims::normalize_document;
use crate::providers::{DEFAULT_VISION_PROMPT, ImageUpload, sanitize_api_error};
use axum::{
    body::{Body, Bytes},
    extract::{Multipart, Query, State},
    http::{HeaderValue, Response, StatusCode, header},
    response::{IntoResponse, Json},
};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Query parameters of `POST /imageDescriptor`
#[derive(Debug, Default, Deserialize)]
pub struct DescribeQuery {
    pub model_id: Option<String>,
    pub prompt: Option<String>,
}

/// `request_id` of `POST /runAgent`, from the JSON body or the query string
#[derive(Debug, Default, Deserialize)]
pub struct RunAgentRequest {
    pub request_id: Option<String>,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response<Body> {
    (status, Json(json!({"detail": detail.into()}))).into_response()
}

/// GET /: liveness message
pub(super) async fn handle_root() -> impl IntoResponse {
    Json(json!({"message": "Server is running"}))
}

/// GET /health
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "cached_descriptions": state.cache.len().await,
    }))
}

/// First `file` field of the form, which must be an image.
async fn read_image_upload(multipart: &mut Multipart) -> Result<ImageUpload, Response<Body>> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")))?;
        let Some(field) = field else {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "Missing 'file' field in upload",
            ));
        };
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(ToString::to_string);
        if !ImageUpload::is_image_type(content_type.as_deref()) {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "File must be an image",
            ));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {e}")))?;
        if bytes.is_empty() {
            return Err(error_response(StatusCode::BAD_REQUEST, "Uploaded file is empty"));
        }

        let media_type = content_type.unwrap_or_default();
        return Ok(ImageUpload::new(media_type, bytes.to_vec()));
    }
}

/// POST /imageDescriptor: stream a description of the uploaded image as
/// plain text. The completed description is cached under the request id
/// returned in `x-request-id`.
pub(super) async fn handle_image_descriptor(
    State(state): State<AppState>,
    Query(query): Query<DescribeQuery>,
    mut multipart: Multipart,
) -> Response<Body> {
    let upload = match read_image_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(response) => return response,
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    let model = query
        .model_id
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.vision_model.clone());
    let prompt = query
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_VISION_PROMPT.to_string());

    tracing::info!(
        request_id = %request_id,
        media_type = %upload.media_type,
        bytes = upload.bytes.len(),
        model = %model,
        "describing image"
    );

    let mut chunks = match state
        .describer
        .describe_image(&upload, &prompt, &model, state.temperature)
        .await
    {
        Ok(stream) => stream,
        Err(e) => {
            let message = sanitize_api_error(&e.to_string());
            tracing::error!(request_id = %request_id, "image description failed: {message}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error processing image: {message}"),
            );
        }
    };

    let cache = state.cache.clone();
    let cache_key = request_id.clone();
    let body = async_stream::stream! {
        let mut description = String::new();
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => {
                    description.push_str(&text);
                    yield Ok::<_, std::io::Error>(Bytes::from(text));
                }
                Err(e) => {
                    tracing::warn!(request_id = %cache_key, "description stream aborted: {e}");
                    yield Err(std::io::Error::other(sanitize_api_error(&e.to_string())));
                    return;
                }
            }
        }
        tracing::info!(request_id = %cache_key, chars = description.len(), "description cached");
        cache.insert(cache_key, description).await;
    };

    let mut response = Response::new(Body::from_stream(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// POST /runAgent: run the claim agent on a cached description and
/// return the normalized recommendation document.
pub(super) async fn handle_run_agent(
    State(state): State<AppState>,
    Query(query): Query<RunAgentRequest>,
    body: Option<Json<RunAgentRequest>>,
) -> Response<Body> {
    let request_id = body
        .and_then(|Json(b)| b.request_id)
        .or(query.request_id)
        .filter(|id| !id.trim().is_empty());
    let Some(request_id) = request_id else {
        return error_response(StatusCode::BAD_REQUEST, "request_id is required");
    };

    let Some(description) = state.cache.get(&request_id).await else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Image description not yet available",
        );
    };

    let preview: String = description.chars().take(100).collect();
    tracing::info!(request_id = %request_id, "running agent with description: {preview}...");

    let run = match state.agent.run(&description).await {
        Ok(run) => run,
        Err(e) => {
            tracing::error!(request_id = %request_id, "agent run failed: {e}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error running agent: {}", sanitize_api_error(&e.to_string())),
            );
        }
    };

    match state
        .store
        .find_by_id(state.agent.recommendations(), &run.object_id)
        .await
    {
        Ok(Some(document)) => {
            let normalized: Value = normalize_document(document);
            (StatusCode::OK, Json(normalized)).into_response()
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("Recommendation {} not found", run.object_id),
        ),
        Err(e) => {
            tracing::error!(request_id = %request_id, "reading recommendation failed: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
