use async_trait::async_trait;
use style_engine::{synthesize, EngineError, GenerationJob, RoomEditRequest};
use thiserror::Error;
use tracing::{info, warn};

pub mod preprocess;
pub mod stable_diffusion;

pub use preprocess::prepare_base_image;
pub use stable_diffusion::HttpImageGenerator;

/// Errors surfaced while producing a transformed room image
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Failure reported by the model backend, passed through unchanged
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// An image-to-image model. Implementations make exactly one attempt per
/// call; retrying is the caller's business.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Run `job` and return the generated image as PNG bytes. The job's
    /// base image has already been resized to the requested resolution.
    async fn generate(&self, job: &GenerationJob) -> Result<Vec<u8>, GenerationError>;
}

/// Generated image together with the prompt that produced it
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub prompt: String,
    pub image: Vec<u8>,
}

/// Validate inputs, build the prompt, normalise the base image and make a
/// single call to `generator`.
///
/// A missing image fails with `InvalidInput` before the generator is touched.
pub async fn transform_room<G>(
    generator: &G,
    base_image: Option<&[u8]>,
    request: &RoomEditRequest,
) -> Result<TransformOutput, GenerationError>
where
    G: ImageGenerator + ?Sized,
{
    let mut job = synthesize(base_image, request)?;

    // Decoding and resampling a large upload is CPU bound
    let (raw, width, height) = (std::mem::take(&mut job.base_image), job.params.width, job.params.height);
    job.base_image = tokio::task::spawn_blocking(move || prepare_base_image(&raw, width, height)).await??;

    info!("Sending transformation to {}: {}", generator.name(), job.prompt);

    let image = generator.generate(&job).await.map_err(|e| {
        warn!("{} failed: {}", generator.name(), e);
        e
    })?;

    info!("Received {} bytes from {}", image.len(), generator.name());

    Ok(TransformOutput {
        prompt: job.prompt,
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every job and answers with a fixed result
    struct RecordingGenerator {
        calls: AtomicUsize,
        last_job: Mutex<Option<GenerationJob>>,
        fail_with: Option<String>,
    }

    impl RecordingGenerator {
        fn new(fail_with: Option<&str>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_job: Mutex::new(None),
                fail_with: fail_with.map(str::to_string),
            }
        }
    }

    #[async_trait]
    impl ImageGenerator for RecordingGenerator {
        fn name(&self) -> &str {
            "recording"
        }

        async fn generate(&self, job: &GenerationJob) -> Result<Vec<u8>, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_job.lock().unwrap() = Some(job.clone());
            match &self.fail_with {
                Some(msg) => Err(GenerationError::ModelInvocation(msg.clone())),
                None => Ok(vec![0x89, b'P', b'N', b'G']),
            }
        }
    }

    fn room_photo() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(80, 60, Rgb([120u8, 110, 100]));
        preprocess::encode_png(&DynamicImage::ImageRgb8(img)).unwrap()
    }

    fn request() -> RoomEditRequest {
        RoomEditRequest {
            room_type: "Kitchen".to_string(),
            change_options: vec!["Lighting".to_string()],
            aesthetic: "Industrial".to_string(),
            color: "#808080".to_string(),
            wood_type: "Walnut".to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_image_never_calls_model() {
        let generator = RecordingGenerator::new(None);

        let err = transform_room(&generator, None, &request()).await.unwrap_err();

        assert!(matches!(err, GenerationError::Engine(EngineError::InvalidInput(_))));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transform_sends_resized_image_and_prompt() {
        let generator = RecordingGenerator::new(None);
        let photo = room_photo();

        let output = transform_room(&generator, Some(photo.as_slice()), &request()).await.unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(output.image, vec![0x89, b'P', b'N', b'G']);
        assert!(output.prompt.contains("featuring gray tones (RGB: 128,128,128)"));

        let job = generator.last_job.lock().unwrap().clone().unwrap();
        assert_eq!(job.prompt, output.prompt);
        let sent = image::load_from_memory(&job.base_image).unwrap();
        assert_eq!(sent.dimensions(), (512, 512));
    }

    #[tokio::test]
    async fn test_model_failure_propagates_unchanged() {
        let generator = RecordingGenerator::new(Some("CUDA out of memory"));
        let photo = room_photo();

        let err = transform_room(&generator, Some(photo.as_slice()), &request()).await.unwrap_err();

        match err {
            GenerationError::ModelInvocation(msg) => assert_eq!(msg, "CUDA out of memory"),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unreadable_image_never_calls_model() {
        let generator = RecordingGenerator::new(None);

        let err = transform_room(&generator, Some(b"garbage".as_slice()), &request())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Image(_)));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }
}
