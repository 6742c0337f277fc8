use std::sync::Arc;

use crate::asr::SpeechToText;
use crate::config::Config;
use crate::elevenlabs::ElevenLabsClient;
use crate::page::IndexPage;
use crate::translate::{GoogleTranslator, Translator};
use crate::tts::TextToSpeech;

/// Per-process handles shared by every handler. Nothing in here is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub translator: Arc<dyn Translator>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub page: Arc<IndexPage>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let translator = Arc::new(GoogleTranslator::new(&config.translate)?);
        let speech = Arc::new(ElevenLabsClient::new(&config.speech, &config.secrets)?);

        Ok(Self::with_collaborators(
            config,
            translator,
            speech.clone(),
            speech,
        ))
    }

    /// Assemble a state around explicit collaborators
    pub fn with_collaborators(
        config: Config,
        translator: Arc<dyn Translator>,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            translator,
            stt,
            tts,
            page: Arc::new(IndexPage::default()),
        }
    }
}
