//! UI state: two photo slots, loading flag, result and error.

use crate::app::preview::{PreviewHandle, PreviewRegistry};
use crate::error::{EmbraceError, Result};
use crate::image::{GeneratedImage, UploadedImage};
use serde::Serialize;

/// Which photo a selection fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// The childhood photo, sent first.
    Childhood,
    /// The recent photo, sent second.
    Recent,
}

impl Slot {
    /// Both slots in send order.
    pub const ALL: [Slot; 2] = [Slot::Childhood, Slot::Recent];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Childhood => "Childhood Photo",
            Self::Recent => "Recent Photo",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Childhood => write!(f, "childhood"),
            Self::Recent => write!(f, "recent"),
        }
    }
}

impl std::str::FromStr for Slot {
    type Err = EmbraceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "childhood" | "young" | "kid" => Ok(Self::Childhood),
            "recent" | "now" | "adult" => Ok(Self::Recent),
            other => Err(EmbraceError::InvalidRequest(format!("unknown photo slot: {other}"))),
        }
    }
}

/// Coarse view of the state, for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// At least one photo missing.
    Idle,
    /// Both photos present, nothing shown yet.
    Ready,
    /// A request is in flight.
    Loading,
    /// A generated image is shown.
    Success,
    /// An error message is shown.
    Failure,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Ready => "ready",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Failure => "failure",
        };
        f.write_str(name)
    }
}

/// Photos captured when generation was triggered.
#[derive(Debug, Clone)]
pub struct GenerationInputs {
    /// Childhood photo.
    pub childhood: UploadedImage,
    /// Recent photo.
    pub recent: UploadedImage,
}

#[derive(Debug)]
struct Selection {
    image: UploadedImage,
    preview: PreviewHandle,
}

/// Application state; owns the preview handles of both slots.
#[derive(Debug)]
pub struct AppState {
    previews: PreviewRegistry,
    childhood: Option<Selection>,
    recent: Option<Selection>,
    loading: bool,
    result: Option<GeneratedImage>,
    error: Option<String>,
    // Set while `error` holds the missing-photo message.
    missing_images: bool,
}

impl AppState {
    /// Creates an empty state drawing previews from `previews`.
    pub fn new(previews: PreviewRegistry) -> Self {
        Self {
            previews,
            childhood: None,
            recent: None,
            loading: false,
            result: None,
            error: None,
            missing_images: false,
        }
    }

    fn selection(&self, slot: Slot) -> Option<&Selection> {
        match slot {
            Slot::Childhood => self.childhood.as_ref(),
            Slot::Recent => self.recent.as_ref(),
        }
    }

    /// Puts a photo in a slot, replacing (and releasing) any previous one.
    ///
    /// An in-flight request keeps the photos it captured and a shown result
    /// stays. A missing-photo message is cleared once both slots are filled.
    pub fn select_image(&mut self, slot: Slot, image: UploadedImage) -> &PreviewHandle {
        let preview = self.previews.acquire(&image.file_name);
        let other_filled = match slot {
            Slot::Childhood => self.recent.is_some(),
            Slot::Recent => self.childhood.is_some(),
        };
        if self.missing_images && other_filled {
            self.missing_images = false;
            self.error = None;
        }
        let target = match slot {
            Slot::Childhood => &mut self.childhood,
            Slot::Recent => &mut self.recent,
        };
        let selection = target.insert(Selection { image, preview });
        &selection.preview
    }

    /// The photo in a slot.
    pub fn image(&self, slot: Slot) -> Option<&UploadedImage> {
        self.selection(slot).map(|s| &s.image)
    }

    /// The preview reference of a slot.
    pub fn preview(&self, slot: Slot) -> Option<&PreviewHandle> {
        self.selection(slot).map(|s| &s.preview)
    }

    /// Returns true when both slots hold a photo.
    pub fn has_both_images(&self) -> bool {
        self.childhood.is_some() && self.recent.is_some()
    }

    /// Returns true while a request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the generate trigger is enabled.
    pub fn can_generate(&self) -> bool {
        self.has_both_images() && !self.loading
    }

    /// The generated image, if the last attempt succeeded.
    pub fn result(&self) -> Option<&GeneratedImage> {
        self.result.as_ref()
    }

    /// The error message, if the last attempt failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failure
        } else if self.result.is_some() {
            Phase::Success
        } else if self.has_both_images() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    /// Starts an attempt and returns the photos to send.
    ///
    /// Rejected while another attempt is in flight. With a slot empty the
    /// precondition message is shown and nothing is sent.
    pub fn begin_generation(&mut self) -> Result<GenerationInputs> {
        if self.loading {
            return Err(EmbraceError::AlreadyInFlight);
        }
        let (childhood, recent) = match (&self.childhood, &self.recent) {
            (Some(c), Some(r)) => (c.image.clone(), r.image.clone()),
            _ => {
                let missing: Vec<Slot> = Slot::ALL
                    .into_iter()
                    .filter(|slot| self.selection(*slot).is_none())
                    .collect();
                let err = EmbraceError::MissingImages { missing };
                self.error = Some(err.user_message());
                self.missing_images = true;
                return Err(err);
            }
        };

        self.loading = true;
        self.result = None;
        self.error = None;
        self.missing_images = false;
        Ok(GenerationInputs { childhood, recent })
    }

    /// Applies the outcome of the in-flight attempt.
    pub fn finish(&mut self, outcome: Result<GeneratedImage>) {
        self.loading = false;
        self.missing_images = false;
        match outcome {
            Ok(image) => {
                self.result = Some(image);
                self.error = None;
            }
            Err(e) => {
                self.result = None;
                self.error = Some(e.user_message());
            }
        }
    }
}
