//! Service response shape and extraction of the generated image.

use crate::error::{EmbraceError, Result};
use crate::image::types::{GeneratedImage, GenerationMetadata};
use serde::{Deserialize, Serialize};

/// Response of a `generateContent` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// Candidate completions, in service order.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt, present when it was blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// One candidate completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Returned content, absent when generation was stopped early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    /// Why generation stopped (`STOP`, `IMAGE_SAFETY`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Content parts of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContent {
    /// Parts in order.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// A returned content part: text, inline data, or both absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

/// Inline base64 data with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the decoded bytes.
    pub mime_type: String,
    /// Base64 payload.
    pub data: String,
}

/// Prompt-level feedback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Block reason, e.g. `SAFETY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
    /// Human-readable block explanation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason_message: Option<String>,
}

impl GenerationResponse {
    /// A response with a single candidate holding the given parts.
    pub fn from_parts(parts: Vec<ResponsePart>) -> Self {
        Self {
            candidates: vec![Candidate {
                content: Some(CandidateContent { parts }),
                finish_reason: Some("STOP".into()),
            }],
            prompt_feedback: None,
        }
    }

    /// A response with one inline image part.
    pub fn with_image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::from_parts(vec![ResponsePart::image(mime_type, data)])
    }

    /// Iterates over every part of every candidate, in order.
    pub fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
    }

    /// Reason the service gave for not producing content, if any.
    pub fn refusal_reason(&self) -> Option<String> {
        if let Some(feedback) = &self.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Some(
                    feedback
                        .block_reason_message
                        .clone()
                        .unwrap_or_else(|| format!("prompt blocked: {reason}")),
                );
            }
        }
        self.candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .find(|r| *r != "STOP")
            .map(str::to_string)
    }
}

impl ResponsePart {
    /// A text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline image part.
    pub fn image(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// Returns the first inline image of the response.
///
/// Fails with [`EmbraceError::NoImage`] when no part anywhere carries inline
/// data; the refusal reason is attached when the service supplied one.
pub fn unwrap_image(
    response: &GenerationResponse,
    metadata: GenerationMetadata,
) -> Result<GeneratedImage> {
    match response.parts().find_map(|p| p.inline_data.as_ref()) {
        Some(inline) => Ok(GeneratedImage::new(
            inline.mime_type.clone(),
            inline.data.clone(),
            metadata,
        )),
        None => Err(EmbraceError::NoImage {
            reason: response.refusal_reason(),
        }),
    }
}
