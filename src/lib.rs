#![warn(missing_docs)]
//! Embrace - picture your childhood self hugging who you are today.
//!
//! This crate sends a childhood photo and a recent photo of the same person
//! to Gemini's image model with a fixed prompt and returns the generated
//! embrace as a data URI.
//!
//! # Quick Start
//!
//! ```no_run
//! use embrace::{generate_embrace, read_image, Config, GeminiProvider};
//!
//! #[tokio::main]
//! async fn main() -> embrace::Result<()> {
//!     let provider = GeminiProvider::from_config(&Config::from_env()?)?;
//!     let childhood = read_image("me-age-6.jpg").await?;
//!     let recent = read_image("me-today.jpg").await?;
//!
//!     let image = generate_embrace(&provider, &childhood, &recent).await?;
//!     image.save("embrace.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Interactive use
//!
//! [`app::Session`] drives the two photo slots, the single in-flight request
//! and the result/error display; the `embrace interactive` command wraps it.

pub mod app;
pub mod config;
mod error;
pub mod image;
mod pipeline;

// Re-export error types at crate root
pub use error::{EmbraceError, Result, NO_IMAGE_MESSAGE, SERVICE_FAILURE_MESSAGE};

pub use config::Config;
pub use image::providers::{GeminiModel, GeminiProvider, GeminiProviderBuilder};
pub use image::{
    encode_image, pick_image, read_image, EncodedImage, GeneratedImage, GenerationMetadata,
    GenerationRequest, GenerationResponse, ImageFormat, ImageProvider, UploadedImage,
    EMBRACE_PROMPT,
};
pub use pipeline::generate_embrace;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::app::{Session, Slot};
    pub use crate::config::Config;
    pub use crate::error::{EmbraceError, Result};
    pub use crate::image::providers::GeminiProvider;
    pub use crate::image::{GeneratedImage, ImageProvider, UploadedImage};
    pub use crate::pipeline::generate_embrace;
}
