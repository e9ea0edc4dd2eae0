//! Interactive application: photo slots, previews and the generation session.

mod preview;
mod session;
mod state;

pub use preview::{PreviewHandle, PreviewId, PreviewRegistry};
pub use session::{Command, Selected, Session};
pub use state::{AppState, GenerationInputs, Phase, Slot};
