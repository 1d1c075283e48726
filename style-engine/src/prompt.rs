use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::Rgb;
use crate::error::{EngineError, EngineResult};

/// Appended to every prompt
const PROMPT_SUFFIX: &str =
    ". Keep the windows where they are. Apply the color scheme to furniture, walls, and decor elements.";

/// Steers the model away from clashing palettes
pub const DEFAULT_NEGATIVE_PROMPT: &str =
    "wrong colors, mismatched colors, conflicting color scheme";

/// User selections describing the desired room makeover
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEditRequest {
    #[serde(default)]
    pub room_type: String,
    #[serde(default)]
    pub change_options: Vec<String>,
    #[serde(default)]
    pub aesthetic: String,
    /// `#RRGGBB`, or empty
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub wood_type: String,
}

/// Sampling parameters handed to the image model alongside the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub width: u32,
    pub height: u32,
    /// How far the output may drift from the base image (0.0-1.0)
    pub strength: f32,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
    pub negative_prompt: String,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            strength: 0.7,
            guidance_scale: 10.0,
            num_inference_steps: 60,
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
        }
    }
}

/// Everything the image model needs for one transformation
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub prompt: String,
    pub params: GenerationParams,
    pub base_image: Vec<u8>,
}

/// Assemble the edit instruction from the present fields of `request`.
///
/// Clauses are appended in a fixed order and skipped when their field is
/// empty, so identical requests always produce identical prompts. A color
/// that does not start with `#` is ignored; one that does but is not a valid
/// `#RRGGBB` value is rejected.
pub fn build_prompt(request: &RoomEditRequest) -> EngineResult<String> {
    let mut prompt = format!("A beautifully designed {}", request.room_type);

    if !request.change_options.is_empty() {
        prompt.push_str(" with ");
        prompt.push_str(&request.change_options.join(", "));
    }

    if !request.aesthetic.is_empty() {
        prompt.push_str(&format!(" in {} style", request.aesthetic));
    }

    if request.color.starts_with('#') {
        let rgb = Rgb::from_hex(&request.color)?;
        let color_name = rgb.classify();
        debug!("Classified {} as {}", request.color, color_name);
        prompt.push_str(&format!(
            " featuring {} tones (RGB: {},{},{})",
            color_name, rgb.r, rgb.g, rgb.b
        ));
    }

    if !request.wood_type.is_empty() {
        prompt.push_str(&format!(" with {} wood finishes", request.wood_type));
    }

    prompt.push_str(PROMPT_SUFFIX);
    Ok(prompt)
}

/// Validate the base image and pair the prompt with default parameters.
///
/// Fails with `InvalidInput` before anything else when no image is supplied.
pub fn synthesize(base_image: Option<&[u8]>, request: &RoomEditRequest) -> EngineResult<GenerationJob> {
    let base_image = match base_image {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(EngineError::InvalidInput("No input image provided".to_string())),
    };

    let prompt = build_prompt(request)?;
    info!("Synthesized prompt for {} ({} bytes of image)", request.room_type, base_image.len());

    Ok(GenerationJob {
        prompt,
        params: GenerationParams::default(),
        base_image: base_image.to_vec(),
    })
}
