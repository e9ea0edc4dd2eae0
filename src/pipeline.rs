//! One generation attempt: encode, build, call, unwrap.

use crate::error::{EmbraceError, Result};
use crate::image::{
    encode_image, unwrap_image, GeneratedImage, GenerationMetadata, GenerationRequest,
    ImageProvider, UploadedImage,
};
use std::time::Instant;

/// Generates an embrace from a childhood and a recent photo.
///
/// The credential is checked before anything is sent. Any failure of the
/// call itself is logged and surfaced as [`EmbraceError::Service`]; a response
/// without image data yields [`EmbraceError::NoImage`].
pub async fn generate_embrace(
    provider: &dyn ImageProvider,
    childhood: &UploadedImage,
    recent: &UploadedImage,
) -> Result<GeneratedImage> {
    provider.ensure_credentials()?;

    let request = GenerationRequest::new(encode_image(childhood), encode_image(recent))?;

    let start = Instant::now();
    let response = match provider.generate_content(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                provider = provider.name(),
                model = provider.model(),
                error = %e,
                "error calling image generation service"
            );
            return Err(EmbraceError::Service);
        }
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    let metadata = GenerationMetadata {
        model: Some(provider.model().to_string()),
        duration_ms: Some(duration_ms),
    };
    match unwrap_image(&response, metadata) {
        Ok(image) => {
            tracing::info!(
                model = provider.model(),
                mime_type = %image.mime_type,
                duration_ms,
                "generated embrace"
            );
            Ok(image)
        }
        Err(e) => {
            tracing::warn!(model = provider.model(), "no image in response: {e:?}");
            Err(e)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider used by tests across the crate.

    use super::*;
    use crate::image::GenerationResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    pub(crate) enum Script {
        Respond(GenerationResponse),
        Fail(fn() -> EmbraceError),
    }

    pub(crate) struct MockProvider {
        script: Script,
        pub(crate) calls: AtomicUsize,
        pub(crate) last_request: Mutex<Option<GenerationRequest>>,
        pub(crate) has_credentials: bool,
        pub(crate) gate: Option<std::sync::Arc<Notify>>,
    }

    impl MockProvider {
        pub(crate) fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                has_credentials: true,
                gate: None,
            }
        }

        pub(crate) fn image(mime: &str, data: &str) -> Self {
            Self::new(Script::Respond(GenerationResponse::with_image(mime, data)))
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageProvider for MockProvider {
        fn ensure_credentials(&self) -> Result<()> {
            if self.has_credentials {
                Ok(())
            } else {
                Err(EmbraceError::Auth("API_KEY not set".into()))
            }
        }

        async fn generate_content(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.script {
                Script::Respond(response) => Ok(response.clone()),
                Script::Fail(make) => Err(make()),
            }
        }

        fn model(&self) -> &str {
            "mock-image-model"
        }

        fn name(&self) -> &str {
            "Mock"
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MockProvider, Script};
    use super::*;
    use crate::image::response::ResponsePart;
    use crate::image::{GenerationResponse, EMBRACE_PROMPT};
    use tracing_test::traced_test;

    fn photos() -> (UploadedImage, UploadedImage) {
        (
            UploadedImage::new(vec![1, 2, 3], "image/jpeg", "kid.jpg"),
            UploadedImage::new(vec![4, 5, 6], "image/png", "now.png"),
        )
    }

    #[tokio::test]
    async fn test_returns_exact_data_uri() {
        let provider = MockProvider::image("image/png", "iVBORw0KGgo=");
        let (kid, now) = photos();

        let image = generate_embrace(&provider, &kid, &now).await.unwrap();
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(image.metadata.model.as_deref(), Some("mock-image-model"));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_both_photos_then_prompt() {
        let provider = MockProvider::image("image/png", "AAAA");
        let (kid, now) = photos();
        let _ = generate_embrace(&provider, &kid, &now).await.unwrap();

        let sent = provider.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(sent.childhood().data, "AQID");
        assert_eq!(sent.childhood().mime_type, "image/jpeg");
        assert_eq!(sent.recent().data, "BAUG");
        assert_eq!(sent.recent().mime_type, "image/png");
        assert_eq!(sent.prompt(), EMBRACE_PROMPT);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let mut provider = MockProvider::image("image/png", "AAAA");
        provider.has_credentials = false;
        let (kid, now) = photos();

        let err = generate_embrace(&provider, &kid, &now).await.unwrap_err();
        assert!(matches!(err, EmbraceError::Auth(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_photo_makes_no_call() {
        let provider = MockProvider::image("image/png", "AAAA");
        let kid = UploadedImage::new(vec![], "image/jpeg", "empty.jpg");
        let (_, now) = photos();

        let err = generate_embrace(&provider, &kid, &now).await.unwrap_err();
        assert!(matches!(err, EmbraceError::InvalidRequest(_)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_response_without_image() {
        let provider = MockProvider::new(Script::Respond(GenerationResponse::from_parts(vec![
            ResponsePart::text("I can't help with that"),
        ])));
        let (kid, now) = photos();

        let err = generate_embrace(&provider, &kid, &now).await.unwrap_err();
        assert!(matches!(err, EmbraceError::NoImage { .. }));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_service_failure_is_generic_and_logged() {
        let provider = MockProvider::new(Script::Fail(|| EmbraceError::Api {
            status: 503,
            message: "model overloaded".into(),
        }));
        let (kid, now) = photos();

        let err = generate_embrace(&provider, &kid, &now).await.unwrap_err();
        assert!(matches!(err, EmbraceError::Service));
        assert!(!err.to_string().contains("overloaded"));
        assert!(logs_contain("model overloaded"));
    }

    #[tokio::test]
    async fn test_auth_rejection_from_service_is_generic() {
        let provider = MockProvider::new(Script::Fail(|| EmbraceError::Auth("API key not valid".into())));
        let (kid, now) = photos();

        let err = generate_embrace(&provider, &kid, &now).await.unwrap_err();
        assert!(matches!(err, EmbraceError::Service));
    }
}
