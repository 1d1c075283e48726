//! Selection-to-prompt translation and the style discovery quiz.
//!
//! Everything here is a pure function of its inputs; the image model itself
//! lives behind the `image-generator` crate.

pub mod catalog;
pub mod color;
pub mod error;
pub mod prompt;
pub mod quiz;

pub use catalog::FormChoices;
pub use color::{classify_rgb, ColorName, Rgb};
pub use error::{EngineError, EngineResult};
pub use prompt::{build_prompt, synthesize, GenerationJob, GenerationParams, RoomEditRequest};
pub use quiz::{QuizCatalog, QuizOutcome, QuizQuestion, QuizSubmission, StyleRecommendation, StyleTally};
