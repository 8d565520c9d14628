//! Plugin lifecycle and the seam to the outside world.

use tracing::info;

use crate::{
    commands::{Command, CommandError, Outcome, run_command},
    editor::Editor,
    error::Result,
    loaders::{ArticleLoader, DocumentLoader, YoutubeLoader},
    notice::Notifier,
    provider::{LanguageModel, OpenAiClient},
    settings::{Settings, SettingsPanel, SettingsStore},
    youtube::TranscriptFetcher,
};

/// Builds the loaders and models a command needs.
pub trait Backend: Send + Sync {
    fn article_loader(&self, url: &str) -> Box<dyn DocumentLoader>;

    fn youtube_loader(
        &self,
        video_id: &str,
        add_video_info: bool,
        language: &str,
    ) -> Box<dyn DocumentLoader>;

    fn language_model(&self, api_key: &str, temperature: f32) -> Box<dyn LanguageModel>;
}

/// Talks to the real web, YouTube and OpenAI.
#[derive(Debug, Clone, Default)]
pub struct HttpBackend {
    openai_base_url: Option<String>,
    youtube_base_url: Option<String>,
}

impl HttpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = Some(base_url.into());
        self
    }

    pub fn with_youtube_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.youtube_base_url = Some(base_url.into());
        self
    }
}

impl Backend for HttpBackend {
    fn article_loader(&self, url: &str) -> Box<dyn DocumentLoader> {
        Box::new(ArticleLoader::new(url))
    }

    fn youtube_loader(
        &self,
        video_id: &str,
        add_video_info: bool,
        language: &str,
    ) -> Box<dyn DocumentLoader> {
        let mut fetcher = TranscriptFetcher::new();
        if let Some(base_url) = &self.youtube_base_url {
            fetcher = fetcher.with_base_url(base_url);
        }
        Box::new(
            YoutubeLoader::new(video_id)
                .with_video_info(add_video_info)
                .with_language(language)
                .with_fetcher(fetcher),
        )
    }

    fn language_model(&self, api_key: &str, temperature: f32) -> Box<dyn LanguageModel> {
        let mut client = OpenAiClient::new(api_key).with_temperature(temperature);
        if let Some(base_url) = &self.openai_base_url {
            client = client.with_base_url(base_url);
        }
        Box::new(client)
    }
}

/// Owns the settings and the registered commands for one session.
pub struct SummarizerPlugin<B: Backend = HttpBackend> {
    settings: Settings,
    store: SettingsStore,
    backend: B,
    commands: Vec<Command>,
}

impl<B: Backend> SummarizerPlugin<B> {
    /// Activate: load settings and register the commands.
    pub async fn on_load(store: SettingsStore, backend: B) -> Result<Self> {
        let settings = store.load().await?;
        let mut plugin = Self {
            settings,
            store,
            backend,
            commands: Vec::new(),
        };

        plugin.add_command(Command::SummarizeWebpage);
        plugin.add_command(Command::SummarizeYoutubeVideo);

        info!(
            commands = plugin.commands.len(),
            data = %plugin.store.path().display(),
            "Plugin loaded"
        );
        Ok(plugin)
    }

    fn add_command(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_panel(&mut self) -> SettingsPanel<'_> {
        SettingsPanel::new(&mut self.settings, &self.store)
    }

    pub async fn run(
        &self,
        command: Command,
        editor: &mut dyn Editor,
        notifier: &dyn Notifier,
    ) -> std::result::Result<Outcome, CommandError> {
        run_command(command, &self.settings, &self.backend, editor, notifier).await
    }

    pub fn on_unload(&mut self) {}
}
