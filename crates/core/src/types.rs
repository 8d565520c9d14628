use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Loosely-typed document metadata.
pub type Metadata = HashMap<String, serde_json::Value>;

/// A piece of extracted text plus what is known about where it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    /// Length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl VideoMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    /// Overlay every field `other` has set, keeping `source`.
    pub fn merge(&mut self, other: VideoMetadata) {
        self.title = other.title.or(self.title.take());
        self.description = other.description.or(self.description.take());
        self.view_count = other.view_count.or(self.view_count);
        self.thumbnail_url = other.thumbnail_url.or(self.thumbnail_url.take());
        self.publish_date = other.publish_date.or(self.publish_date.take());
        self.length = other.length.or(self.length);
        self.author = other.author.or(self.author.take());
    }

    pub fn into_metadata(self) -> Metadata {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => Metadata::new(),
        }
    }
}

/// One caption fragment, timings in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptItem {
    pub text: String,
    pub offset: f64,
    pub duration: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Estimated time to read, in seconds
    pub ttr: u64,
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Article {
    /// Split the article into its body and everything else.
    pub fn into_parts(mut self) -> (Option<String>, Metadata) {
        let content = self.content.take();
        let metadata = match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => Metadata::new(),
        };
        (content, metadata)
    }
}
