pub mod interface;
pub mod google;

pub use interface::{Direction, TranslateResponse, Translator};
pub use google::GoogleTranslator;
