//! The two user-invocable summarize commands.
//!
//! Both run the same steps: check the API key, read the selection, load the
//! content, summarize it, and insert the summary on the line after the cursor.

use thiserror::Error;
use tracing::{error, info};

use crate::{
    chain::SummarizationChain,
    editor::{Editor, Position},
    error::PrecisError,
    notice::Notifier,
    plugin::Backend,
    settings::Settings,
    splitter::RecursiveCharacterTextSplitter,
    types::Document,
    youtube::extract_youtube_video_id,
};

pub const MISSING_API_KEY: &str = "Please fill in your Open AI API Key";
pub const INVALID_YOUTUBE_URL: &str = "Please select a YouTube video URL";
pub const NOTHING_TO_SUMMARIZE: &str = "Nothing to summarize";
pub const WEBPAGE_LOAD_FAILED: &str = "Error loading webpage";
pub const VIDEO_LOAD_FAILED: &str = "Error loading video";
pub const SUMMARIZE_FAILED: &str = "Error summarizing content";

/// Webpages are cut into chunks of this many characters before summarizing
pub const CHUNK_SIZE: usize = 2000;
pub const CHUNK_OVERLAP: usize = 0;

pub const TEMPERATURE: f32 = 0.0;

pub const TRANSCRIPT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SummarizeWebpage,
    SummarizeYoutubeVideo,
}

impl Command {
    pub const ALL: [Command; 2] = [Command::SummarizeWebpage, Command::SummarizeYoutubeVideo];

    pub fn id(&self) -> &'static str {
        match self {
            Command::SummarizeWebpage => "summarize-webpage",
            Command::SummarizeYoutubeVideo => "summarize-youtube-video",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SummarizeWebpage => "Summarize webpage",
            Command::SummarizeYoutubeVideo => "Summarize YouTube video",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.id() == id)
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to load content: {0}")]
    Load(#[source] PrecisError),

    #[error("Failed to summarize content: {0}")]
    Summarize(#[source] PrecisError),
}

/// How a command run ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped early; the note is untouched.
    Aborted { notice: &'static str },
    /// The trimmed summary was inserted at `at`; the cursor now sits at `cursor`.
    Inserted {
        summary: String,
        at: Position,
        cursor: Position,
    },
}

fn abort(notifier: &dyn Notifier, notice: &'static str) -> Outcome {
    notifier.notice(notice);
    Outcome::Aborted { notice }
}

pub async fn run_command(
    command: Command,
    settings: &Settings,
    backend: &dyn Backend,
    editor: &mut dyn Editor,
    notifier: &dyn Notifier,
) -> Result<Outcome, CommandError> {
    if !settings.has_api_key() {
        return Ok(abort(notifier, MISSING_API_KEY));
    }

    info!(command = command.id(), "Running command");
    match command {
        Command::SummarizeWebpage => summarize_webpage(settings, backend, editor, notifier).await,
        Command::SummarizeYoutubeVideo => {
            summarize_youtube_video(settings, backend, editor, notifier).await
        }
    }
}

async fn summarize_webpage(
    settings: &Settings,
    backend: &dyn Backend,
    editor: &mut dyn Editor,
    notifier: &dyn Notifier,
) -> Result<Outcome, CommandError> {
    let url = editor.selection().trim().to_string();
    let loader = backend.article_loader(&url);
    let splitter =
        RecursiveCharacterTextSplitter::new(CHUNK_SIZE, CHUNK_OVERLAP).map_err(CommandError::Load)?;

    let documents = match loader.load_and_split(&splitter).await {
        Ok(documents) => documents,
        Err(e) => {
            error!(%url, "Failed to load webpage: {e}");
            notifier.notice(WEBPAGE_LOAD_FAILED);
            return Err(CommandError::Load(e));
        }
    };

    if documents.is_empty() {
        return Ok(abort(notifier, NOTHING_TO_SUMMARIZE));
    }

    info!(%url, chunks = documents.len(), "Webpage loaded");
    let summary = summarize(
        SummarizationChain::map_reduce(),
        settings,
        backend,
        &documents,
        notifier,
    )
    .await?;

    Ok(insert_summary(editor, &summary))
}

async fn summarize_youtube_video(
    settings: &Settings,
    backend: &dyn Backend,
    editor: &mut dyn Editor,
    notifier: &dyn Notifier,
) -> Result<Outcome, CommandError> {
    let Some(video_id) = extract_youtube_video_id(editor.selection().trim()) else {
        return Ok(abort(notifier, INVALID_YOUTUBE_URL));
    };

    let loader = backend.youtube_loader(&video_id, false, TRANSCRIPT_LANGUAGE);
    let transcript = match loader.load().await {
        Ok(transcript) => transcript,
        Err(e) => {
            error!(%video_id, "Failed to load video: {e}");
            notifier.notice(VIDEO_LOAD_FAILED);
            return Err(CommandError::Load(e));
        }
    };

    info!(%video_id, "Transcript loaded");
    let summary = summarize(
        SummarizationChain::stuff(),
        settings,
        backend,
        &transcript,
        notifier,
    )
    .await?;

    Ok(insert_summary(editor, &summary))
}

async fn summarize(
    chain: SummarizationChain,
    settings: &Settings,
    backend: &dyn Backend,
    documents: &[Document],
    notifier: &dyn Notifier,
) -> Result<String, CommandError> {
    let model = backend.language_model(settings.openai_api_key.trim(), TEMPERATURE);

    chain
        .run(model.as_ref(), documents)
        .await
        .map_err(|e| {
            error!(chain = ?chain.chain_type(), "Summarization failed: {e}");
            notifier.notice(SUMMARIZE_FAILED);
            CommandError::Summarize(e)
        })
}

/// Put the trimmed summary at the start of the line after the cursor and
/// leave the cursor at its end.
fn insert_summary(editor: &mut dyn Editor, summary: &str) -> Outcome {
    let summary = summary.trim();
    let cursor = editor.cursor();
    let at = editor.clip_pos(Position::new(cursor.line + 1, 0));

    editor.replace_range(summary, at);
    let end = at.advance(summary);
    editor.set_cursor(end);

    Outcome::Inserted {
        summary: summary.to_string(),
        at,
        cursor: end,
    }
}
