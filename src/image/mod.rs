//! Image generation module.

pub mod encoder;
mod provider;
pub mod providers;
pub mod request;
pub mod response;
mod types;

pub use encoder::{encode_image, pick_image, read_image, strip_data_uri_header};
pub use provider::ImageProvider;
pub use request::{GenerationRequest, EMBRACE_PROMPT};
pub use response::{unwrap_image, GenerationResponse};
pub use types::{
    is_image_mime, EncodedImage, GeneratedImage, GenerationMetadata, ImageFormat, UploadedImage,
};
