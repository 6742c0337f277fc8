pub mod interface;
pub mod stream;

pub use interface::{AudioStream, TextToSpeech};
pub use stream::forward_audio;
