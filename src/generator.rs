//! The generation pipeline: preview, prompt, one API call, cleanup, write.

use crate::factory::GeneratorConfig;
use crate::output::write_script;
use crate::postprocess::{HeaderInfo, PostProcessor};
use crate::preview::{DatasetPreview, PreviewOptions};
use crate::prompt::{build_prompt, PromptTemplate};
use crate::{Error, FinishReason, LLMProvider, LLMRequest, Prompt, Usage};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A cleaned-up script ready to be saved.
#[derive(Debug, Clone)]
pub struct GeneratedDashboard {
    pub code: String,
    pub model: String,
    pub usage: Usage,
    pub finish_reason: FinishReason,
    pub main_block_appended: bool,
}

/// Generates Dash dashboard scripts from a dataset and a user prompt.
pub struct DashboardGenerator {
    provider: Box<dyn LLMProvider>,
    config: GeneratorConfig,
    template: PromptTemplate,
    postprocessor: PostProcessor,
}

impl DashboardGenerator {
    pub fn new(provider: Box<dyn LLMProvider>, config: GeneratorConfig) -> Self {
        Self {
            provider,
            config,
            template: PromptTemplate::default(),
            postprocessor: PostProcessor::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_postprocessor(mut self, postprocessor: PostProcessor) -> Self {
        self.postprocessor = postprocessor;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Load the preview and assemble the prompt without calling the API.
    pub fn prepare(&self, dataset_path: &Path, user_prompt: &str) -> Result<Prompt, Error> {
        if user_prompt.trim().is_empty() {
            return Err(Error::config("the dashboard prompt must not be empty"));
        }

        tracing::info!(dataset = %dataset_path.display(), "loading dataset preview");
        let options = PreviewOptions::default().with_sample_rows(self.config.sample_rows);
        let preview = DatasetPreview::load(dataset_path, &options)?;
        tracing::info!(
            columns = preview.columns.len(),
            rows = preview.total_rows,
            "dataset loaded"
        );

        let prompt = build_prompt(
            &self.template,
            &dataset_path.to_string_lossy(),
            user_prompt,
            &preview,
        )?;
        tracing::debug!(chars = prompt.char_count(), "prompt assembled");
        Ok(prompt)
    }

    /// Run the pipeline up to (not including) the file write.
    pub async fn generate(
        &self,
        dataset_path: &Path,
        user_prompt: &str,
    ) -> Result<GeneratedDashboard, Error> {
        let prompt = self.prepare(dataset_path, user_prompt)?;

        let mut request = LLMRequest::from_prompt(&self.config.model, &prompt);
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;

        tracing::info!(
            provider = self.provider.name(),
            model = %self.config.model,
            "requesting dashboard code (this may take a while)"
        );
        let started = Instant::now();
        let response = self.provider.generate(&request).await?.buffer().await?;
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model finished"
        );
        if response.finish_reason == FinishReason::Length {
            tracing::warn!("the reply hit the token limit and may be truncated");
        }

        let header = HeaderInfo {
            dataset_path: dataset_path.display().to_string(),
            user_prompt: user_prompt.to_string(),
            model: self.config.model.clone(),
            provider: self.provider.name().to_string(),
        };
        let processed = self.postprocessor.process(&response.content, &header)?;

        Ok(GeneratedDashboard {
            code: processed.code,
            model: self.config.model.clone(),
            usage: response.usage,
            finish_reason: response.finish_reason,
            main_block_appended: processed.main_block_appended,
        })
    }

    /// Save a generated script.
    pub fn save(
        &self,
        dashboard: &GeneratedDashboard,
        output_path: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, Error> {
        let path = write_script(output_path, &dashboard.code, overwrite)?;
        tracing::info!(path = %path.display(), "dashboard code saved");
        Ok(path)
    }

    /// Generate and save in one go.
    pub async fn run(
        &self,
        dataset_path: &Path,
        user_prompt: &str,
        output_path: &Path,
        overwrite: bool,
    ) -> Result<PathBuf, Error> {
        let dashboard = self.generate(dataset_path, user_prompt).await?;
        self.save(&dashboard, output_path, overwrite)
    }
}
