use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub index: IndexConfig,
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Root directory scanned recursively for documents.
    pub root: PathBuf,
    /// File-name suffix to include, matched case-sensitively.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    ".md".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Location of the persisted vector index. Deleted in full on rebuild.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `openai` or `azure`.
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    /// Azure deployment name; required when provider is `azure`.
    #[serde(default)]
    pub deployment: Option<String>,
    /// Texts per API call. The Azure embeddings backend only accepts one
    /// input per request, so this defaults to 1.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// `openai` or `azure`.
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    /// Azure deployment name; required when provider is `azure`.
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_chat_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks assembled into the answer context.
    #[serde(default = "default_k")]
    pub k: usize,
    /// Size of the similarity-ranked candidate pool the diversified
    /// result set is selected from.
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,
    /// MMR balance factor: 1.0 = pure relevance, 0.0 = pure diversity.
    #[serde(default = "default_lambda")]
    pub lambda: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_k(),
            fetch_k: default_fetch_k(),
            lambda: default_lambda(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_batch_size() -> usize {
    1
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_chat_timeout_secs() -> u64 {
    60
}
fn default_k() -> usize {
    4
}
fn default_fetch_k() -> usize {
    10
}
fn default_lambda() -> f32 {
    0.5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate corpus
    if config.corpus.extension.is_empty() {
        anyhow::bail!("corpus.extension must not be empty");
    }

    // Validate retrieval
    if config.retrieval.k < 1 {
        anyhow::bail!("retrieval.k must be >= 1");
    }
    if config.retrieval.fetch_k < config.retrieval.k {
        anyhow::bail!("retrieval.fetch_k must be >= retrieval.k");
    }
    if !(0.0..=1.0).contains(&config.retrieval.lambda) {
        anyhow::bail!("retrieval.lambda must be in [0.0, 1.0]");
    }

    // Validate providers
    for (section, provider, deployment) in [
        (
            "embedding",
            config.embedding.provider.as_str(),
            config.embedding.deployment.as_ref(),
        ),
        (
            "chat",
            config.chat.provider.as_str(),
            config.chat.deployment.as_ref(),
        ),
    ] {
        match provider {
            "openai" | "azure" => {}
            other => anyhow::bail!(
                "Unknown {} provider: '{}'. Must be openai or azure.",
                section,
                other
            ),
        }
        if provider == "azure" && deployment.is_none() {
            anyhow::bail!(
                "{}.deployment must be specified when provider is 'azure'",
                section
            );
        }
    }

    if config.embedding.provider == "openai" && config.embedding.model.is_none() {
        anyhow::bail!("embedding.model must be specified when provider is 'openai'");
    }
    if config.chat.provider == "openai" && config.chat.model.is_none() {
        anyhow::bail!("chat.model must be specified when provider is 'openai'");
    }

    if config.embedding.batch_size != 1 {
        anyhow::bail!("embedding.batch_size must be 1 (provider-side limit)");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    const VALID: &str = r#"
[corpus]
root = "data"
extension = ".md"

[index]
path = "data/index.sqlite"

[embedding]
provider = "azure"
model = "text-embedding-ada-002"
deployment = "embeddings"

[chat]
provider = "azure"
deployment = "gpt-4"

[retrieval]
k = 4
fetch_k = 10
lambda = 0.5
"#;

    #[test]
    fn test_load_valid_config() {
        let f = write_config(VALID);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.corpus.extension, ".md");
        assert_eq!(config.retrieval.fetch_k, 10);
        assert_eq!(config.embedding.batch_size, 1);
    }

    #[test]
    fn test_retrieval_defaults() {
        let minimal = r#"
[corpus]
root = "data"

[index]
path = "data/index.sqlite"

[embedding]
provider = "openai"
model = "text-embedding-3-small"

[chat]
provider = "openai"
model = "gpt-4o-mini"
"#;
        let f = write_config(minimal);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.retrieval.k, 4);
        assert_eq!(config.retrieval.fetch_k, 10);
        assert!((config.retrieval.lambda - 0.5).abs() < 1e-6);
        assert_eq!(config.corpus.extension, ".md");
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let f = write_config(&VALID.replace("provider = \"azure\"", "provider = \"cohere\""));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown"), "got: {}", err);
    }

    #[test]
    fn test_rejects_fetch_k_below_k() {
        let f = write_config(&VALID.replace("fetch_k = 10", "fetch_k = 2"));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("fetch_k"), "got: {}", err);
    }

    #[test]
    fn test_rejects_lambda_out_of_range() {
        let f = write_config(&VALID.replace("lambda = 0.5", "lambda = 1.5"));
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_rejects_azure_without_deployment() {
        let f = write_config(&VALID.replace("deployment = \"gpt-4\"\n", ""));
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("deployment"), "got: {}", err);
    }

    #[test]
    fn test_rejects_missing_file() {
        assert!(load_config(Path::new("/nonexistent/copilot.toml")).is_err());
    }
}
