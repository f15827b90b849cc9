//! Prompt templates for Vidya.
//!
//! Prompts can be customized by placing a `prompts.toml` file in the custom
//! prompts directory. Templates use `{{name}}` placeholders.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"))
}

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// Optional system prompt for the tool-calling agent. Empty means none.
    pub agent: String,
    /// Relevance grading prompt (`{{context}}`, `{{question}}`).
    pub grader: String,
    /// Question rewriting prompt (`{{question}}`).
    pub rewriter: String,
    /// Answer generation prompt (`{{context}}`, `{{question}}`).
    pub generator: String,
    /// Topic extraction prompt (`{{text}}`).
    pub topics: String,
    /// Reply from the topic prompt meaning "no video suggestion".
    pub unrelated_marker: String,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            agent: String::new(),

            grader: r#"You are a grader assessing relevance of a retrieved document to a user question.
Here is the retrieved document: {{context}}
Here is the user question: {{question}}
If the document contains keyword(s) or semantic meaning related to the user question, grade it as relevant.
Give a binary score 'yes' or 'no' score to indicate whether the document is relevant to the question."#
                .to_string(),

            rewriter: r#"Look at the input and try to reason about the underlying semantic intent / meaning.
Here is the initial question: {{question}}
Formulate an improved question:"#
                .to_string(),

            generator: r#"You are an assistant for question-answering tasks. Use the following pieces of retrieved context to answer the question. If you don't know the answer, just say that you don't know. Use three sentences maximum and keep the answer concise.
Question: {{question}}
Context: {{context}}
Answer:"#
                .to_string(),

            topics: r#"Analyze the following text and determine if it's related to the sound chapter from NCERT textbooks.
If it is related to sound, extract 3-5 key topics from the text, separated by commas.
If it's not related to sound, return 'Not related to sound chapter'.

Text: {{text}}

Output:"#
                .to_string(),

            unrelated_marker: "Not related to sound chapter".to_string(),
            variables: HashMap::new(),
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

        if let Some(dir) = custom_dir {
            let path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("prompts.toml");
            if path.exists() {
                let content = std::fs::read_to_string(&path)?;
                prompts = toml::from_str(&content)?;
            }
        }

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are resolved in one pass over the template, so values
    /// are inserted verbatim even when they contain `{{name}}` themselves.
    /// Unknown placeholders are left as they are.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert((*key).to_string(), (*value).to_string());
        }
        Self::render(template, &merged)
    }
}
