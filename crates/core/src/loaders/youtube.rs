use async_trait::async_trait;
use tracing::error;

use crate::{
    error::Result,
    format::combine_transcript,
    loaders::DocumentLoader,
    types::{Document, VideoMetadata},
    youtube::TranscriptFetcher,
};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Loads the transcript of one YouTube video as a single document.
#[derive(Debug, Clone)]
pub struct YoutubeLoader {
    video_id: String,
    add_video_info: bool,
    language: String,
    fetcher: TranscriptFetcher,
}

impl YoutubeLoader {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            add_video_info: false,
            language: DEFAULT_LANGUAGE.to_string(),
            fetcher: TranscriptFetcher::new(),
        }
    }

    /// Also record the video's title, author, length and so on.
    pub fn with_video_info(mut self, add_video_info: bool) -> Self {
        self.add_video_info = add_video_info;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_fetcher(mut self, fetcher: TranscriptFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub async fn video_info(&self) -> Result<VideoMetadata> {
        self.fetcher.video_details(&self.video_id).await
    }
}

#[async_trait]
impl DocumentLoader for YoutubeLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let mut metadata = VideoMetadata::new(&self.video_id);

        if self.add_video_info {
            metadata.merge(self.video_info().await?);
        }

        let transcript = self
            .fetcher
            .fetch_transcript(&self.video_id, &self.language)
            .await
            .inspect_err(|e| {
                error!(video_id = %self.video_id, language = %self.language, "Failed to fetch transcript: {e}");
            })?;

        Ok(vec![Document::new(
            combine_transcript(&transcript),
            metadata.into_metadata(),
        )])
    }
}
