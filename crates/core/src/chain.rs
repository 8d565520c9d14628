//! Summarization chains over a [`LanguageModel`].

use futures::future::try_join_all;
use tracing::{debug, info};

use crate::{error::Result, format::estimate_tokens, provider::LanguageModel, types::Document};

pub const SUMMARY_PROMPT: &str = "Write a concise summary of the following:\n\n\n\"{text}\"\n\n\nCONCISE SUMMARY:";

/// Token budget for a single stuffed prompt
pub const DEFAULT_MAX_TOKENS: usize = 3000;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    /// Every document in one prompt
    Stuff,
    /// Summarize documents one by one, then combine the summaries
    MapReduce,
}

#[derive(Debug, Clone)]
pub struct SummarizationChain {
    chain_type: ChainType,
    max_tokens: usize,
    max_iterations: usize,
    ensure_map_step: bool,
}

pub fn format_prompt(text: &str) -> String {
    SUMMARY_PROMPT.replace("{text}", text)
}

fn stuff_prompt(documents: &[Document]) -> String {
    let text = documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format_prompt(&text)
}

impl SummarizationChain {
    pub fn new(chain_type: ChainType) -> Self {
        Self {
            chain_type,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            ensure_map_step: false,
        }
    }

    pub fn stuff() -> Self {
        Self::new(ChainType::Stuff)
    }

    pub fn map_reduce() -> Self {
        Self::new(ChainType::MapReduce)
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Always run the map step at least once, even if the input already fits.
    pub fn with_ensure_map_step(mut self, ensure_map_step: bool) -> Self {
        self.ensure_map_step = ensure_map_step;
        self
    }

    pub fn chain_type(&self) -> ChainType {
        self.chain_type
    }

    pub async fn run(&self, model: &dyn LanguageModel, documents: &[Document]) -> Result<String> {
        match self.chain_type {
            ChainType::Stuff => Self::stuff_documents(model, documents).await,
            ChainType::MapReduce => self.map_reduce_documents(model, documents).await,
        }
    }

    async fn stuff_documents(model: &dyn LanguageModel, documents: &[Document]) -> Result<String> {
        let prompt = stuff_prompt(documents);
        debug!(documents = documents.len(), tokens = estimate_tokens(&prompt), "Stuffing documents");
        model.complete(&prompt).await
    }

    async fn map_reduce_documents(
        &self,
        model: &dyn LanguageModel,
        documents: &[Document],
    ) -> Result<String> {
        let mut current = documents.to_vec();

        for iteration in 0..self.max_iterations {
            let can_skip_map = iteration != 0 || !self.ensure_map_step;
            if can_skip_map {
                let tokens = estimate_tokens(&stuff_prompt(&current));
                if tokens <= self.max_tokens {
                    debug!(iteration, tokens, "Documents fit into one prompt");
                    break;
                }
            }

            info!(iteration, documents = current.len(), "Summarizing chunks");
            let summaries = try_join_all(
                current
                    .iter()
                    .map(|doc| async move { model.complete(&format_prompt(&doc.content)).await }),
            )
            .await?;

            current = current
                .into_iter()
                .zip(summaries)
                .map(|(doc, summary)| Document::new(summary, doc.metadata))
                .collect();
        }

        Self::stuff_documents(model, &current).await
    }
}
