//! Summarize the webpage or YouTube video whose URL is selected in a note.

pub mod article;
pub mod chain;
pub mod commands;
pub mod editor;
pub mod error;
pub mod format;
pub mod loaders;
pub mod notice;
pub mod plugin;
pub mod provider;
pub mod settings;
pub mod splitter;
pub mod types;
pub mod youtube;

pub use chain::{ChainType, SummarizationChain};
pub use commands::{Command, CommandError, Outcome};
pub use editor::{Editor, Position, TextBuffer};
pub use error::{PrecisError, Result, TranscriptError};
pub use loaders::{ArticleLoader, DocumentLoader, YoutubeLoader};
pub use notice::Notifier;
pub use plugin::{Backend, HttpBackend, SummarizerPlugin};
pub use provider::{LanguageModel, OpenAiClient};
pub use settings::{Settings, SettingsPanel, SettingsStore, get_data_path};
pub use splitter::RecursiveCharacterTextSplitter;
pub use types::{Document, Metadata, VideoMetadata};
pub use youtube::extract_youtube_video_id;
