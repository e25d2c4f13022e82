use serde::{Deserialize, Serialize};

use crate::caption::CaptionLayout;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct RenderRequest {
    pub(crate) image_base64: String,
    pub(crate) upper: Option<String>,
    pub(crate) lower: Option<String>,
    pub(crate) font_scale: Option<f32>,
    pub(crate) output_mime: Option<String>,
    pub(crate) layout_only: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenderResponse {
    pub(crate) mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) image_base64: Option<String>,
    pub(crate) captions: Vec<CaptionLayout>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
