use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrecisError {
    #[error("Request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Transcript unavailable: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("Invalid API response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Invalid splitter configuration: overlap {overlap} is larger than chunk size {size}")]
    InvalidChunkOverlap { size: usize, overlap: usize },

    #[error("Failed to access settings at {path}: {reason}")]
    Settings { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

/// Ways a caption track lookup can fail for a single video.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("YouTube is receiving too many requests from this IP and now requires solving a captcha")]
    TooManyRequests,

    #[error("The video is no longer available ({video_id})")]
    VideoUnavailable { video_id: String },

    #[error("Transcript is disabled on this video ({video_id})")]
    TranscriptsDisabled { video_id: String },

    #[error("No transcripts are available in {lang} for this video ({video_id}). Available languages: {}", available.join(", "))]
    LanguageNotAvailable {
        video_id: String,
        lang: String,
        available: Vec<String>,
    },

    #[error("No transcript found for this video ({video_id})")]
    NoTranscript { video_id: String },
}

pub type Result<T> = std::result::Result<T, PrecisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PrecisError::HttpStatus {
                url: "https://example.com".to_string(),
                status: 404
            }
            .to_string(),
            "Request to https://example.com failed with status 404"
        );
        assert_eq!(
            TranscriptError::LanguageNotAvailable {
                video_id: "dQw4w9WgXcQ".to_string(),
                lang: "fr".to_string(),
                available: vec!["en".to_string(), "de".to_string()],
            }
            .to_string(),
            "No transcripts are available in fr for this video (dQw4w9WgXcQ). Available languages: en, de"
        );
    }

    #[test]
    fn test_transcript_error_converts() {
        let err: PrecisError = TranscriptError::TooManyRequests.into();
        assert!(matches!(
            err,
            PrecisError::Transcript(TranscriptError::TooManyRequests)
        ));
    }
}
