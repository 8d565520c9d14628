//! YouTube URL parsing and caption retrieval.
//!
//! Transcripts are read the way a browser gets them: the watch page embeds
//! the player response JSON, which lists the caption tracks; each track's
//! `baseUrl` serves timed-text XML.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    error::{PrecisError, Result, TranscriptError},
    types::{TranscriptItem, VideoMetadata},
};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

const PLAYER_RESPONSE: &str = "ytInitialPlayerResponse";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36,gzip(gfe)";

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.)?(?:youtu\.be/|youtube\.com/(?:embed/|v/|watch\?v=|watch\?.+&v=))([A-Za-z0-9_-]{11})(?:\S+)?$",
    )
    .expect("video url pattern is valid")
});

static TIMED_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<text start="([^"]*)" dur="([^"]*)"[^>]*>([^<]*)</text>"#)
        .expect("timed text pattern is valid")
});

/// Extract the 11-character video id from a YouTube URL.
///
/// Accepts `youtu.be/<id>`, `youtube.com/watch?v=<id>`, `youtube.com/embed/<id>`,
/// `youtube.com/v/<id>` and watch URLs carrying `v=<id>` after other query
/// parameters. Anything else yields `None`.
pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    VIDEO_URL
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fetches caption tracks and video details from YouTube.
#[derive(Debug, Clone)]
pub struct TranscriptFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Default for TranscriptFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_text(&self, url: &str, lang: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept-Language", lang)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PrecisError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    async fn player_response(&self, video_id: &str, lang: &str) -> Result<Value> {
        let url = format!("{}/watch?v={}", self.base_url, video_id);
        debug!(%url, "Fetching watch page");
        let page = self.get_text(&url, lang).await?;

        if page.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::TooManyRequests.into());
        }

        parse_player_response(&page)
            .filter(|player| player.get("playabilityStatus").is_some())
            .ok_or_else(|| {
                TranscriptError::VideoUnavailable {
                    video_id: video_id.to_string(),
                }
                .into()
            })
    }

    /// Fetch the caption track of `video_id` in `lang`.
    pub async fn fetch_transcript(
        &self,
        video_id: &str,
        lang: &str,
    ) -> Result<Vec<TranscriptItem>> {
        let player = self.player_response(video_id, lang).await?;
        let track_url = select_caption_track(video_id, &player, lang)?;

        debug!(url = %track_url, "Fetching timed text");
        let xml = self.get_text(&track_url, lang).await?;
        let items = parse_timed_text(&xml);

        if items.is_empty() {
            return Err(TranscriptError::NoTranscript {
                video_id: video_id.to_string(),
            }
            .into());
        }

        info!(video_id, lang, fragments = items.len(), "Transcript fetched");
        Ok(items)
    }

    /// Video details published on the watch page.
    pub async fn video_details(&self, video_id: &str) -> Result<VideoMetadata> {
        let player = self.player_response(video_id, "en").await?;
        Ok(video_metadata(video_id, &player))
    }
}

/// Locate and parse the `ytInitialPlayerResponse` object embedded in a watch page.
///
/// The name can appear several times (including `= null` placeholders); the
/// first assignment of a JSON object wins.
fn parse_player_response(page: &str) -> Option<Value> {
    page.match_indices(PLAYER_RESPONSE)
        .find_map(|(start, name)| {
            let rest = page[start + name.len()..]
                .trim_start_matches(['"', '\'', ']'])
                .trim_start();
            let rest = rest.strip_prefix('=')?.trim_start();

            serde_json::Deserializer::from_str(rest)
                .into_iter::<Value>()
                .next()?
                .ok()
                .filter(Value::is_object)
        })
}

fn select_caption_track(video_id: &str, player: &Value, lang: &str) -> Result<String> {
    let tracks = player["captions"]["playerCaptionsTracklistRenderer"]["captionTracks"]
        .as_array()
        .filter(|tracks| !tracks.is_empty())
        .ok_or_else(|| TranscriptError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        })?;

    tracks
        .iter()
        .find(|track| track["languageCode"].as_str() == Some(lang))
        .and_then(|track| track["baseUrl"].as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            TranscriptError::LanguageNotAvailable {
                video_id: video_id.to_string(),
                lang: lang.to_string(),
                available: tracks
                    .iter()
                    .filter_map(|track| track["languageCode"].as_str())
                    .map(str::to_string)
                    .collect(),
            }
            .into()
        })
}

fn parse_timed_text(xml: &str) -> Vec<TranscriptItem> {
    TIMED_TEXT
        .captures_iter(xml)
        .map(|caps| TranscriptItem {
            offset: caps[1].parse().unwrap_or(0.0),
            duration: caps[2].parse().unwrap_or(0.0),
            text: decode_entities(&caps[3]),
        })
        .collect()
}

/// Timed text is XML-escaped HTML, so entities may be encoded twice.
fn decode_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    for _ in 0..2 {
        if !decoded.contains('&') {
            break;
        }
        decoded = Html::parse_fragment(&decoded)
            .root_element()
            .text()
            .collect();
    }
    decoded
}

fn video_metadata(video_id: &str, player: &Value) -> VideoMetadata {
    let details = &player["videoDetails"];
    let as_string = |value: &Value| value.as_str().map(str::to_string);
    let as_number = |value: &Value| value.as_str().and_then(|s| s.parse::<u64>().ok());

    VideoMetadata {
        source: video_id.to_string(),
        title: as_string(&details["title"]),
        description: as_string(&details["shortDescription"]),
        view_count: as_number(&details["viewCount"]),
        thumbnail_url: details["thumbnail"]["thumbnails"]
            .as_array()
            .and_then(|thumbs| thumbs.last())
            .and_then(|thumb| as_string(&thumb["url"])),
        publish_date: as_string(
            &player["microformat"]["playerMicroformatRenderer"]["publishDate"],
        ),
        length: as_number(&details["lengthSeconds"]),
        author: as_string(&details["author"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_short_url() {
        assert_eq!(
            extract_youtube_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_extract_supported_shapes() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "youtube.com/embed/dQw4w9WgXcQ",
            "www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ?si=abc",
        ];
        for url in urls {
            assert_eq!(
                extract_youtube_video_id(url).as_deref(),
                Some("dQw4w9WgXcQ"),
                "{url}"
            );
        }
    }

    #[test]
    fn test_extract_id_with_hyphen_and_underscore() {
        assert_eq!(
            extract_youtube_video_id("https://youtu.be/a-b_c-d_e-f").as_deref(),
            Some("a-b_c-d_e-f")
        );
    }

    #[test]
    fn test_extract_rejects_other_strings() {
        let inputs = [
            "not a url",
            "",
            "https://vimeo.com/123456789",
            "https://youtu.be/short",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/channel/dQw4w9WgXcQ",
            "see https://youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ and more",
        ];
        for input in inputs {
            assert_eq!(extract_youtube_video_id(input), None, "{input}");
        }
    }

    #[test]
    fn test_parse_player_response() {
        let page = r#"<script>var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"},"videoDetails":{"title":"A; b"}};var meta = 1;</script>"#;
        let player = parse_player_response(page).unwrap();
        assert_eq!(player["videoDetails"]["title"], "A; b");
    }

    #[test]
    fn test_parse_player_response_skips_placeholders() {
        let page = r#"<script>window["ytInitialPlayerResponse"] = null;</script><script>if (ytInitialPlayerResponse) {}</script><script>var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"}};</script>"#;
        let player = parse_player_response(page).unwrap();
        assert_eq!(player["playabilityStatus"]["status"], "OK");
    }

    #[test]
    fn test_parse_player_response_missing() {
        assert!(parse_player_response("<html></html>").is_none());
    }

    #[test]
    fn test_select_caption_track_by_language() {
        let player = serde_json::json!({
            "captions": {"playerCaptionsTracklistRenderer": {"captionTracks": [
                {"languageCode": "de", "baseUrl": "https://example.com/de"},
                {"languageCode": "en", "baseUrl": "https://example.com/en"}
            ]}}
        });
        assert_eq!(
            select_caption_track("id", &player, "en").unwrap(),
            "https://example.com/en"
        );

        let err = select_caption_track("id", &player, "fr").unwrap_err();
        match err {
            PrecisError::Transcript(TranscriptError::LanguageNotAvailable {
                available, ..
            }) => assert_eq!(available, vec!["de", "en"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_select_caption_track_disabled() {
        let player = serde_json::json!({"playabilityStatus": {}});
        assert!(matches!(
            select_caption_track("id", &player, "en"),
            Err(PrecisError::Transcript(
                TranscriptError::TranscriptsDisabled { .. }
            ))
        ));
    }

    #[test]
    fn test_parse_timed_text() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="1.25">Hello &amp;amp; welcome</text><text start="1.75" dur="2">it&amp;#39;s me</text></transcript>"#;
        let items = parse_timed_text(xml);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text, "Hello & welcome");
        assert_eq!(items[0].offset, 0.5);
        assert_eq!(items[0].duration, 1.25);
        assert_eq!(items[1].text, "it's me");
    }

    #[test]
    fn test_video_metadata_from_player() {
        let player = serde_json::json!({
            "videoDetails": {
                "title": "Never Gonna Give You Up",
                "shortDescription": "Official video",
                "viewCount": "1500000000",
                "lengthSeconds": "212",
                "author": "Rick Astley",
                "thumbnail": {"thumbnails": [{"url": "small.jpg"}, {"url": "large.jpg"}]}
            },
            "microformat": {"playerMicroformatRenderer": {"publishDate": "2009-10-24"}}
        });
        let metadata = video_metadata("dQw4w9WgXcQ", &player);
        assert_eq!(metadata.source, "dQw4w9WgXcQ");
        assert_eq!(metadata.view_count, Some(1_500_000_000));
        assert_eq!(metadata.length, Some(212));
        assert_eq!(metadata.thumbnail_url.as_deref(), Some("large.jpg"));
        assert_eq!(metadata.publish_date.as_deref(), Some("2009-10-24"));
    }
}
