//! The generation request: two inline photos followed by a fixed prompt.

use crate::error::{EmbraceError, Result};
use crate::image::types::EncodedImage;

/// Instruction sent after the two photos. Not user-configurable.
pub const EMBRACE_PROMPT: &str = "Given the first image is a childhood photo of the user and the second is a recent photo of the same person, generate an image that realistically depicts the younger and older versions warmly embracing or hugging each other in a natural, heartwarming scene. Maintain facial features, hairstyles, and relevant age differences. The setting should feel positive, with both versions of the person looking happy and comfortable.";

/// Output modality requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    /// Image output only.
    Image,
}

impl Modality {
    /// Returns the wire name of this modality.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "IMAGE",
        }
    }
}

/// One unit of request content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPart<'a> {
    /// Inline base64 image.
    InlineImage(&'a EncodedImage),
    /// Plain text instruction.
    Text(&'a str),
}

/// A request to generate an embrace from a childhood and a recent photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    childhood: EncodedImage,
    recent: EncodedImage,
    prompt: &'static str,
}

impl GenerationRequest {
    /// Builds a request from the two encoded photos.
    ///
    /// Both payloads and MIME types must be non-empty.
    pub fn new(childhood: EncodedImage, recent: EncodedImage) -> Result<Self> {
        for (label, image) in [("childhood", &childhood), ("recent", &recent)] {
            if image.data.is_empty() {
                return Err(EmbraceError::InvalidRequest(format!(
                    "{label} photo is empty"
                )));
            }
            if image.mime_type.trim().is_empty() {
                return Err(EmbraceError::InvalidRequest(format!(
                    "{label} photo has no MIME type"
                )));
            }
        }
        Ok(Self {
            childhood,
            recent,
            prompt: EMBRACE_PROMPT,
        })
    }

    /// The childhood photo.
    pub fn childhood(&self) -> &EncodedImage {
        &self.childhood
    }

    /// The recent photo.
    pub fn recent(&self) -> &EncodedImage {
        &self.recent
    }

    /// The instruction text.
    pub fn prompt(&self) -> &str {
        self.prompt
    }

    /// Content parts in send order: childhood, recent, prompt.
    pub fn parts(&self) -> [RequestPart<'_>; 3] {
        [
            RequestPart::InlineImage(&self.childhood),
            RequestPart::InlineImage(&self.recent),
            RequestPart::Text(self.prompt),
        ]
    }

    /// Output modalities requested from the model.
    pub fn response_modalities(&self) -> &'static [Modality] {
        &[Modality::Image]
    }
}
