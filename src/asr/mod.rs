pub mod interface;

pub use interface::{AudioUpload, SpeechToText, Transcription};
