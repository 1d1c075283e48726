use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use style_engine::GenerationJob;
use tracing::{info, warn};

use crate::preprocess::{from_base64, to_base64};
use crate::{GenerationError, ImageGenerator};

const IMG2IMG_PATH: &str = "/sdapi/v1/img2img";

/// Image-to-image client for a Stable Diffusion WebUI compatible server
pub struct HttpImageGenerator {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct Img2ImgRequest<'a> {
    init_images: Vec<String>,
    prompt: &'a str,
    negative_prompt: &'a str,
    denoising_strength: f32,
    cfg_scale: f32,
    steps: u32,
    width: u32,
    height: u32,
    batch_size: u32,
}

#[derive(Debug, Deserialize)]
struct Img2ImgResponse {
    #[serde(default)]
    images: Vec<String>,
}

impl HttpImageGenerator {
    /// Create a new generator
    ///
    /// # Arguments
    /// * `base_url` - Server root, e.g. `http://127.0.0.1:7860`
    /// * `api_token` - Optional bearer token
    pub fn new(base_url: impl Into<String>, api_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        }
    }

    /// Create from `SD_API_URL` and optional `SD_API_TOKEN`
    pub fn from_env() -> Result<Self, GenerationError> {
        let base_url = std::env::var("SD_API_URL")
            .map_err(|_| GenerationError::Config("SD_API_URL environment variable not set".to_string()))?;
        let api_token = std::env::var("SD_API_TOKEN").ok().filter(|t| !t.is_empty());
        Ok(Self::new(base_url, api_token))
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, IMG2IMG_PATH)
    }

    fn build_request<'a>(job: &'a GenerationJob) -> Img2ImgRequest<'a> {
        Img2ImgRequest {
            init_images: vec![to_base64(&job.base_image)],
            prompt: &job.prompt,
            negative_prompt: &job.params.negative_prompt,
            denoising_strength: job.params.strength,
            cfg_scale: job.params.guidance_scale,
            steps: job.params.num_inference_steps,
            width: job.params.width,
            height: job.params.height,
            batch_size: 1,
        }
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    fn name(&self) -> &str {
        "stable-diffusion"
    }

    async fn generate(&self, job: &GenerationJob) -> Result<Vec<u8>, GenerationError> {
        let body = Self::build_request(job);
        info!("Sending img2img request to {} ({} steps)", self.base_url, body.steps);

        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerationError::ModelInvocation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Image model error: {} - {}", status, error_text);
            return Err(GenerationError::ModelInvocation(format!("{} - {}", status, error_text)));
        }

        let api_response: Img2ImgResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ModelInvocation(format!("Malformed model response: {}", e)))?;

        first_image(api_response)
    }
}

fn first_image(response: Img2ImgResponse) -> Result<Vec<u8>, GenerationError> {
    let encoded = response
        .images
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::ModelInvocation("No image returned by model".to_string()))?;
    from_base64(&encoded).map_err(|e| GenerationError::ModelInvocation(format!("Malformed image from model: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_engine::GenerationParams;

    fn job() -> GenerationJob {
        GenerationJob {
            prompt: "A beautifully designed Office".to_string(),
            params: GenerationParams::default(),
            base_image: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_request_body_carries_params() {
        let job = job();
        let body = serde_json::to_value(HttpImageGenerator::build_request(&job)).unwrap();

        assert_eq!(body["prompt"], "A beautifully designed Office");
        assert_eq!(body["init_images"][0], "AQID");
        assert_eq!(body["steps"], 60);
        assert_eq!(body["width"], 512);
        assert_eq!(body["height"], 512);
        assert_eq!(body["cfg_scale"], 10.0);
        assert!((body["denoising_strength"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(
            body["negative_prompt"],
            "wrong colors, mismatched colors, conflicting color scheme"
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let generator = HttpImageGenerator::new("http://127.0.0.1:7860/", None);
        assert_eq!(generator.endpoint(), "http://127.0.0.1:7860/sdapi/v1/img2img");
    }

    #[test]
    fn test_first_image() {
        let response: Img2ImgResponse =
            serde_json::from_str(r#"{"images": ["AQID", "BAUG"], "info": "{}"}"#).unwrap();
        assert_eq!(first_image(response).unwrap(), vec![1, 2, 3]);

        let empty: Img2ImgResponse = serde_json::from_str(r#"{"images": []}"#).unwrap();
        assert!(matches!(first_image(empty), Err(GenerationError::ModelInvocation(_))));

        // A garbled payload is the model's fault, not the caller's
        let garbled: Img2ImgResponse = serde_json::from_str(r#"{"images": ["@@@"]}"#).unwrap();
        match first_image(garbled) {
            Err(GenerationError::ModelInvocation(msg)) => assert!(msg.starts_with("Malformed image from model")),
            other => panic!("expected model failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_model_failure() {
        let generator = HttpImageGenerator::new("http://127.0.0.1:9", None);

        let err = generator.generate(&job()).await.unwrap_err();
        assert!(matches!(err, GenerationError::ModelInvocation(_)));
    }
}
