use async_trait::async_trait;

use crate::{
    article::ArticleExtractor,
    error::Result,
    loaders::DocumentLoader,
    types::{Article, Document},
};

/// Loads the readable article behind a URL.
#[derive(Debug, Clone)]
pub struct ArticleLoader {
    url: String,
    extractor: ArticleExtractor,
}

impl ArticleLoader {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extractor: ArticleExtractor::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Zero documents when nothing was extracted, otherwise exactly one.
pub(crate) fn article_documents(article: Option<Article>) -> Vec<Document> {
    match article {
        Some(article) => {
            let (content, metadata) = article.into_parts();
            vec![Document::new(content.unwrap_or_default(), metadata)]
        }
        None => Vec::new(),
    }
}

#[async_trait]
impl DocumentLoader for ArticleLoader {
    async fn load(&self) -> Result<Vec<Document>> {
        let article = self.extractor.extract(&self.url).await?;
        Ok(article_documents(article))
    }
}
