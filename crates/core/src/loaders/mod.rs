//! Document loaders
//!
//! A loader turns one external resource (a web page, a YouTube video) into
//! [`Document`]s ready for summarization.

mod article;
mod youtube;

pub use article::ArticleLoader;
pub use youtube::YoutubeLoader;

use async_trait::async_trait;

use crate::{error::Result, splitter::RecursiveCharacterTextSplitter, types::Document};

#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self) -> Result<Vec<Document>>;

    /// Load, then cut every document into chunks with `splitter`.
    async fn load_and_split(
        &self,
        splitter: &RecursiveCharacterTextSplitter,
    ) -> Result<Vec<Document>> {
        let documents = self.load().await?;
        Ok(splitter.split_documents(&documents))
    }
}
