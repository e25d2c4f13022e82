use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{ErrorResponse, RenderRequest, RenderResponse};
use super::state::ServerState;
use crate::caption::{CaptionRequest, image_format_from_mime};
use crate::image_source::{self, PNG_MIME, SourceImage};
use crate::settings;

pub async fn run_server(
    settings: settings::Settings,
    addr: String,
    font_path: Option<String>,
    font_family: Option<String>,
) -> Result<()> {
    let font = crate::resolve_font(&settings, font_path.as_deref(), font_family.as_deref())?;
    let state = Arc::new(ServerState { settings, font });
    let app = Router::new()
        .route("/health", get(health))
        .route("/render", post(render))
        .with_state(state)
        .layer(axum::middleware::from_fn(cors_middleware));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind server address: {}", addr))?;
    info!("server: listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Result<Response<Body>, StatusCode> {
    if req.method() == Method::OPTIONS {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return Ok(response);
    }
    let mut response = next.run(req).await;
    apply_cors_headers(response.headers_mut());
    Ok(response)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type,authorization"),
    );
}

#[derive(Debug)]
struct RenderError {
    status: StatusCode,
    message: String,
}

impl RenderError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{:#}", err),
        }
    }
}

async fn render(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<RenderRequest>,
) -> Result<Json<RenderResponse>, (StatusCode, Json<ErrorResponse>)> {
    let result = tokio::task::spawn_blocking(move || render_request(state.as_ref(), payload))
        .await
        .map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("server task failed: {}", err),
                }),
            )
        })?;

    match result {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            warn!("render: {} {}", err.status, err.message);
            Err((err.status, Json(ErrorResponse { error: err.message })))
        }
    }
}

fn render_request(state: &ServerState, payload: RenderRequest) -> Result<RenderResponse, RenderError> {
    let output_mime = resolve_output_mime(payload.output_mime.as_deref())?;
    let image = decode_image(&payload.image_base64)?;
    let request = CaptionRequest {
        upper: payload.upper.unwrap_or_default(),
        lower: payload.lower.unwrap_or_default(),
        font_scale: payload.font_scale.unwrap_or(1.0),
    };
    let overlay = crate::build_overlay(&image, &request, &state.settings, &state.font);

    if payload.layout_only.unwrap_or(false) {
        return Ok(RenderResponse {
            mime: output_mime,
            image_base64: None,
            captions: overlay.captions,
        });
    }

    let bytes = crate::caption::render_svg_bytes(
        &overlay.svg,
        &output_mime,
        Some(state.font.metrics.data()),
    )
    .map_err(RenderError::internal)?;
    Ok(RenderResponse {
        mime: output_mime,
        image_base64: Some(BASE64.encode(bytes)),
        captions: overlay.captions,
    })
}

fn resolve_output_mime(raw: Option<&str>) -> Result<String, RenderError> {
    let mime = raw
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| PNG_MIME.to_string());
    if image_format_from_mime(&mime).is_none() {
        return Err(RenderError::bad_request(format!(
            "unsupported output_mime '{}'",
            mime
        )));
    }
    Ok(mime)
}

fn decode_image(image_base64: &str) -> Result<SourceImage, RenderError> {
    let encoded = image_base64.trim();
    if encoded.is_empty() {
        return Err(RenderError::bad_request("image_base64 is required"));
    }
    let encoded = encoded
        .split_once(";base64,")
        .map(|(_, data)| data)
        .unwrap_or(encoded);
    let bytes = BASE64
        .decode(encoded)
        .map_err(|err| RenderError::bad_request(format!("invalid image_base64: {}", err)))?;
    image_source::load_image_from_bytes(bytes, None)
        .map_err(|err| RenderError::bad_request(format!("{:#}", err)))
}
