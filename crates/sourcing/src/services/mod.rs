//! External-service clients: translation, generative copy, media download.

pub mod assets;
pub mod detail_page;
pub mod gemini;
pub mod translate;

pub use assets::{AssetFetcher, AssetKind, FetchedAsset};
pub use detail_page::{DetailPageInput, Synthesizer, sanitize_detail_content};
pub use gemini::{CopyModel, GeminiClient, GenerateError};
pub use translate::{Translation, Translator};
