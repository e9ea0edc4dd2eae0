//! Line-driven interactive session over [`AppState`].

use crate::app::preview::PreviewRegistry;
use crate::app::state::{AppState, Phase, Slot};
use crate::error::{EmbraceError, Result};
use crate::image::{pick_image, GeneratedImage, ImageProvider};
use crate::pipeline::generate_embrace;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const HELP: &str = "\
commands:
  childhood <path>   select the childhood photo
  recent <path>      select the recent photo
  generate           create the embrace (needs both photos)
  wait               block until the running generation finishes
  status             show photos, phase and result
  show               print the result as a data URI
  save <path>        write the result to a file
  help               show this message
  quit               leave (a running generation is abandoned)
";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select a photo for a slot.
    Select(Slot, PathBuf),
    /// Trigger generation.
    Generate,
    /// Wait for the in-flight attempt.
    Wait,
    /// Print the current state.
    Status,
    /// Print the result data URI.
    Show,
    /// Save the result.
    Save(PathBuf),
    /// Print help.
    Help,
    /// Leave the session.
    Quit,
}

impl std::str::FromStr for Command {
    type Err = EmbraceError;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let path = |what: &str| {
            if rest.is_empty() {
                Err(EmbraceError::InvalidRequest(format!("usage: {what} <path>")))
            } else {
                Ok(PathBuf::from(rest))
            }
        };
        match word.to_lowercase().as_str() {
            "childhood" | "recent" => Ok(Self::Select(word.parse()?, path(word)?)),
            "generate" | "go" => Ok(Self::Generate),
            "wait" => Ok(Self::Wait),
            "status" => Ok(Self::Status),
            "show" => Ok(Self::Show),
            "save" => Ok(Self::Save(path("save")?)),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(EmbraceError::InvalidRequest(format!(
                "unknown command: {other} (try `help`)"
            ))),
        }
    }
}

/// Result of selecting a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selected {
    /// The photo was placed; carries its preview reference.
    Placed(String),
    /// The file was not an image and was ignored.
    Ignored,
}

/// Drives one [`AppState`] against a provider.
///
/// Generation runs on a spawned task and reports back over a channel, so
/// commands keep being accepted while the request is in flight. Dropping the
/// session drops the receiver; a late outcome is then discarded.
pub struct Session {
    state: AppState,
    provider: Arc<dyn ImageProvider>,
    outcome_tx: mpsc::UnboundedSender<Result<GeneratedImage>>,
    outcome_rx: mpsc::UnboundedReceiver<Result<GeneratedImage>>,
}

impl Session {
    /// Creates a session with an empty state.
    pub fn new(provider: Arc<dyn ImageProvider>) -> Self {
        Self::with_previews(provider, PreviewRegistry::new())
    }

    /// Creates a session drawing previews from `previews`.
    pub fn with_previews(provider: Arc<dyn ImageProvider>, previews: PreviewRegistry) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(previews),
            provider,
            outcome_tx,
            outcome_rx,
        }
    }

    /// The current state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Reads a file and places it in a slot; non-image files are ignored.
    pub async fn select(&mut self, slot: Slot, path: impl Into<PathBuf>) -> Result<Selected> {
        let path = path.into();
        match pick_image(&path).await? {
            Some(image) => {
                let preview = self.state.select_image(slot, image);
                Ok(Selected::Placed(preview.url().to_string()))
            }
            None => Ok(Selected::Ignored),
        }
    }

    /// Starts a generation attempt in the background.
    pub fn trigger(&mut self) -> Result<()> {
        let inputs = self.state.begin_generation()?;
        let provider = Arc::clone(&self.provider);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let outcome = generate_embrace(provider.as_ref(), &inputs.childhood, &inputs.recent).await;
            if tx.send(outcome).is_err() {
                tracing::debug!("session closed before generation finished; dropping outcome");
            }
        });
        Ok(())
    }

    /// Waits for the in-flight attempt, if any, and applies its outcome.
    pub async fn wait(&mut self) -> Phase {
        if self.state.is_loading() {
            if let Some(outcome) = self.outcome_rx.recv().await {
                self.state.finish(outcome);
            }
        }
        self.state.phase()
    }

    fn apply(&mut self, outcome: Result<GeneratedImage>) {
        self.state.finish(outcome);
    }

    /// Renders a status block for display.
    pub fn render_status(&self) -> String {
        let mut out = String::new();
        for slot in Slot::ALL {
            match (self.state.image(slot), self.state.preview(slot)) {
                (Some(image), Some(preview)) => out.push_str(&format!(
                    "{}: {} ({}, {} bytes) {}\n",
                    slot.label(),
                    image.file_name,
                    image.mime_type,
                    image.size(),
                    preview.url()
                )),
                _ => out.push_str(&format!("{}: <not selected>\n", slot.label())),
            }
        }
        out.push_str(&format!("phase: {}\n", self.state.phase()));
        out.push_str(&format!(
            "generate: {}\n",
            if self.state.can_generate() {
                "enabled"
            } else {
                "disabled"
            }
        ));
        if let Some(error) = self.state.error() {
            out.push_str(&format!("error: {error}\n"));
        }
        if let Some(image) = self.state.result() {
            out.push_str(&format!(
                "result: {} ({} base64 chars)\n",
                image.mime_type,
                image.data.len()
            ));
        }
        out
    }

    /// Executes one command, returning the text to display and whether to stop.
    pub async fn execute(&mut self, command: Command) -> (String, bool) {
        let reply = match command {
            Command::Select(slot, path) => match self.select(slot, &path).await {
                Ok(Selected::Placed(url)) => format!("{} selected: {url}\n", slot.label()),
                Ok(Selected::Ignored) => String::new(),
                Err(e) => format!("error: {}\n", e.user_message()),
            },
            Command::Generate => match self.trigger() {
                Ok(()) => "Generating your moment...\n".to_string(),
                Err(e) => format!("error: {}\n", e.user_message()),
            },
            Command::Wait => {
                self.wait().await;
                self.render_outcome()
            }
            Command::Status => self.render_status(),
            Command::Show => match self.state.result() {
                Some(image) => format!("{}\n", image.to_data_url()),
                None => "no generated image yet\n".to_string(),
            },
            Command::Save(path) => match self.state.result() {
                Some(image) => match image.save(&path) {
                    Ok(bytes) => format!("saved {} ({bytes} bytes)\n", path.display()),
                    Err(e) => format!("error: {}\n", e.user_message()),
                },
                None => "no generated image yet\n".to_string(),
            },
            Command::Help => HELP.to_string(),
            Command::Quit => return (String::new(), true),
        };
        (reply, false)
    }

    fn render_outcome(&self) -> String {
        match (self.state.result(), self.state.error()) {
            (Some(image), _) => format!(
                "Your generated image is ready ({}). Use `save <path>` or `show`.\n",
                image.mime_type
            ),
            (None, Some(error)) => format!("Oops! {error}\n"),
            (None, None) => String::new(),
        }
    }

    /// Runs the session until `quit` or end of input.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        output.write_all(b"Generational Embrace. Type `help` for commands.\n").await?;
        output.flush().await?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let (reply, stop) = match line.parse::<Command>() {
                        Ok(command) => self.execute(command).await,
                        Err(e) => (format!("error: {}\n", e.user_message()), false),
                    };
                    output.write_all(reply.as_bytes()).await?;
                    output.flush().await?;
                    if stop {
                        break;
                    }
                }
                Some(outcome) = self.outcome_rx.recv(), if self.state.is_loading() => {
                    self.apply(outcome);
                    output.write_all(self.render_outcome().as_bytes()).await?;
                    output.flush().await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NO_IMAGE_MESSAGE, SERVICE_FAILURE_MESSAGE};
    use crate::image::GenerationResponse;
    use crate::pipeline::testing::{MockProvider, Script};
    use tokio::sync::Notify;

    const PNG_BYTES: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 1];

    fn write_photos(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
        let kid = dir.path().join("kid.png");
        let now = dir.path().join("now.jpg");
        std::fs::write(&kid, PNG_BYTES).unwrap();
        std::fs::write(&now, [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        (kid, now)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "childhood ./me as kid.png".parse::<Command>().unwrap(),
            Command::Select(Slot::Childhood, PathBuf::from("./me as kid.png"))
        );
        assert_eq!(
            "RECENT now.jpg".parse::<Command>().unwrap(),
            Command::Select(Slot::Recent, PathBuf::from("now.jpg"))
        );
        assert_eq!("generate".parse::<Command>().unwrap(), Command::Generate);
        assert_eq!(" quit ".parse::<Command>().unwrap(), Command::Quit);
        assert!("save".parse::<Command>().is_err());
        assert!("childhood".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn test_generate_with_empty_slots_makes_no_call() {
        let provider = Arc::new(MockProvider::image("image/png", "AAAA"));
        let mut session = Session::new(provider.clone());

        let (reply, _) = session.execute(Command::Generate).await;
        assert!(reply.contains("Please upload both photos"));
        assert_eq!(session.state().phase(), Phase::Failure);
        assert!(!session.state().is_loading());
        tokio::task::yield_now().await;
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_full_generation() {
        let dir = tempfile::tempdir().unwrap();
        let (kid, now) = write_photos(&dir);
        let provider = Arc::new(MockProvider::image("image/png", "iVBORw0KGgo="));
        let mut session = Session::new(provider.clone());

        assert!(matches!(
            session.select(Slot::Childhood, &kid).await.unwrap(),
            Selected::Placed(_)
        ));
        session.select(Slot::Recent, &now).await.unwrap();
        assert!(session.state().can_generate());

        session.trigger().unwrap();
        assert!(session.state().is_loading());
        assert_eq!(session.wait().await, Phase::Success);
        assert_eq!(
            session.state().result().unwrap().to_data_url(),
            "data:image/png;base64,iVBORw0KGgo="
        );
        assert_eq!(provider.calls(), 1);

        let sent = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.childhood().mime_type, "image/png");
        assert_eq!(sent.recent().mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_trigger_rejected_while_in_flight() {
        let dir = tempfile::tempdir().unwrap();
        let (kid, now) = write_photos(&dir);
        let gate = Arc::new(Notify::new());
        let mut mock = MockProvider::image("image/png", "AAAA");
        mock.gate = Some(gate.clone());
        let provider = Arc::new(mock);
        let mut session = Session::new(provider.clone());
        session.select(Slot::Childhood, &kid).await.unwrap();
        session.select(Slot::Recent, &now).await.unwrap();

        session.trigger().unwrap();
        assert!(!session.state().can_generate());
        assert!(matches!(session.trigger(), Err(EmbraceError::AlreadyInFlight)));

        // Re-selecting is still allowed while the request is pending.
        session.select(Slot::Childhood, &now).await.unwrap();

        gate.notify_one();
        assert_eq!(session.wait().await, Phase::Success);
        assert_eq!(provider.calls(), 1);
        let sent = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.childhood().mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_service_failure_clears_loading() {
        let dir = tempfile::tempdir().unwrap();
        let (kid, now) = write_photos(&dir);
        let provider = Arc::new(MockProvider::new(Script::Fail(|| EmbraceError::Api {
            status: 500,
            message: "boom".into(),
        })));
        let mut session = Session::new(provider);
        session.select(Slot::Childhood, &kid).await.unwrap();
        session.select(Slot::Recent, &now).await.unwrap();

        session.trigger().unwrap();
        assert_eq!(session.wait().await, Phase::Failure);
        assert!(!session.state().is_loading());
        assert!(session.state().result().is_none());
        assert_eq!(session.state().error(), Some(SERVICE_FAILURE_MESSAGE));
        assert!(session.state().can_generate());
    }

    #[tokio::test]
    async fn test_no_image_response() {
        let dir = tempfile::tempdir().unwrap();
        let (kid, now) = write_photos(&dir);
        let provider = Arc::new(MockProvider::new(Script::Respond(
            GenerationResponse::default(),
        )));
        let mut session = Session::new(provider);
        session.select(Slot::Childhood, &kid).await.unwrap();
        session.select(Slot::Recent, &now).await.unwrap();

        session.trigger().unwrap();
        assert_eq!(session.wait().await, Phase::Failure);
        assert_eq!(session.state().error(), Some(NO_IMAGE_MESSAGE));
        assert!(session.state().result().is_none());
    }

    #[tokio::test]
    async fn test_non_image_selection_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "hello").unwrap();
        let mut session = Session::new(Arc::new(MockProvider::image("image/png", "AAAA")));

        assert_eq!(
            session.select(Slot::Childhood, &notes).await.unwrap(),
            Selected::Ignored
        );
        assert!(session.state().image(Slot::Childhood).is_none());
    }

    #[tokio::test]
    async fn test_dropping_session_discards_late_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let (kid, now) = write_photos(&dir);
        let gate = Arc::new(Notify::new());
        let mut mock = MockProvider::image("image/png", "AAAA");
        mock.gate = Some(gate.clone());
        let provider = Arc::new(mock);
        let previews = PreviewRegistry::new();
        let mut session = Session::with_previews(provider.clone(), previews.clone());
        session.select(Slot::Childhood, &kid).await.unwrap();
        session.select(Slot::Recent, &now).await.unwrap();
        session.trigger().unwrap();

        drop(session);
        assert_eq!(previews.live_count(), 0);
        assert_eq!(previews.double_releases(), 0);

        gate.notify_one();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_scripted_session() {
        let dir = tempfile::tempdir().unwrap();
        let (kid, now) = write_photos(&dir);
        let out_path = dir.path().join("embrace.png");
        let script = format!(
            "childhood {}\nrecent {}\ngenerate\nwait\nsave {}\nstatus\nquit\n",
            kid.display(),
            now.display(),
            out_path.display()
        );
        let provider = Arc::new(MockProvider::image("image/png", "AQID"));
        let mut session = Session::new(provider);
        let mut output = Vec::new();

        session
            .run(tokio::io::BufReader::new(script.as_bytes()), &mut output)
            .await
            .unwrap();

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Childhood Photo selected"));
        assert!(text.contains("Your generated image is ready"));
        assert!(text.contains("phase: success"));
        assert_eq!(std::fs::read(&out_path).unwrap(), vec![1, 2, 3]);
    }
}
