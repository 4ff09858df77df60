//! Prompt templates for Discern.
//!
//! Prompts can be customized by placing a `summary.toml` file in the custom
//! prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for transcript summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// System instruction that opens every conversation.
    pub system: String,
    /// User turn wrapping the transcript. `{{transcript}}` is replaced.
    pub transcript: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            system: r#"You summarize videos from the transcription of their audio track.

The user message contains the full transcription between delimiter tags. The
transcription is machine generated, so expect missing punctuation and the
occasional misheard word; infer the intended meaning from context.

Guidelines:
- Open with one sentence stating what the video is about
- Then cover the key points, claims and conclusions in the order they appear
- Skip sponsor reads, subscription requests, greetings and sign-offs
- Do not invent content that is not in the transcription
- Write plain prose without markdown, lists or headings; the summary may be read aloud
- Keep it short enough to listen to in about a minute"#
                .to_string(),

            transcript: "<BEGIN TRANSCRIPTION FROM VIDEO'S AUDIO>{{transcript}}<END TRANSCRIPTION FROM VIDEO'S AUDIO>"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The system instruction with custom variables applied.
    pub fn system_instruction(&self) -> String {
        self.render_with_custom(self.summary.system.trim(), &HashMap::new())
    }

    /// Wrap a transcript in the transcript template.
    pub fn wrap_transcript(&self, transcript: &str) -> String {
        // Substitute the transcript last so text inside it is never treated as a placeholder.
        let template = self.render_with_custom(&self.summary.transcript, &HashMap::new());
        template.replace("{{transcript}}", transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.summary.system.is_empty());
        assert!(prompts.summary.transcript.contains("{{transcript}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_wrap_transcript() {
        let prompts = Prompts::default();
        assert_eq!(
            prompts.wrap_transcript("hello world"),
            "<BEGIN TRANSCRIPTION FROM VIDEO'S AUDIO>hello world<END TRANSCRIPTION FROM VIDEO'S AUDIO>"
        );
    }

    #[test]
    fn test_transcript_placeholders_are_left_alone() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("lang".to_string(), "English".to_string());
        prompts.summary.transcript = "[{{lang}}] {{transcript}}".to_string();

        assert_eq!(prompts.wrap_transcript("say {{lang}}"), "[English] say {{lang}}");
    }

    #[test]
    fn test_load_custom_summary_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "system = \"Be brief about {{topic}}.\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), "cooking".to_string());
        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();

        assert_eq!(prompts.system_instruction(), "Be brief about cooking.");
        // Fields missing from the file keep their defaults.
        assert!(prompts.summary.transcript.contains("{{transcript}}"));
    }
}
