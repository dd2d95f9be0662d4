use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::keywords::DEFAULT_VOCABULARY;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub vault: VaultConfig,
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub truncation: TruncationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct VaultConfig {
    pub root: PathBuf,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_final_limit")]
    pub final_limit: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            final_limit: default_final_limit(),
        }
    }
}

fn default_final_limit() -> i64 {
    12
}

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Where weekly reports are written. Defaults to `<vault.root>/synthesis`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Durable synthesis index. Defaults to `<output_dir>/index.json`.
    #[serde(default)]
    pub index_path: Option<PathBuf>,
    #[serde(default = "default_min_group_size")]
    pub min_group_size: usize,
    #[serde(default = "default_max_groups")]
    pub max_groups: usize,
    #[serde(default = "default_members_per_group")]
    pub members_per_group: usize,
    #[serde(default = "default_key_insights")]
    pub key_insights: usize,
    #[serde(default = "default_low_rating_threshold")]
    pub low_rating_threshold: u8,
    #[serde(default = "default_vocabulary")]
    pub vocabulary: Vec<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            index_path: None,
            min_group_size: default_min_group_size(),
            max_groups: default_max_groups(),
            members_per_group: default_members_per_group(),
            key_insights: default_key_insights(),
            low_rating_threshold: default_low_rating_threshold(),
            vocabulary: default_vocabulary(),
        }
    }
}

fn default_min_group_size() -> usize {
    3
}
fn default_max_groups() -> usize {
    10
}
fn default_members_per_group() -> usize {
    5
}
fn default_key_insights() -> usize {
    5
}
fn default_low_rating_threshold() -> u8 {
    3
}
fn default_vocabulary() -> Vec<String> {
    DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
        }
    }
}

fn default_context_lines() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StateConfig {
    /// Work-continuity document. Defaults to `<vault.root>/state/work.json`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Body truncation limits, in characters. Learnings are never truncated.
#[derive(Debug, Deserialize, Clone)]
pub struct TruncationConfig {
    #[serde(default = "default_journal_chars")]
    pub journal_chars: usize,
    #[serde(default = "default_session_chars")]
    pub session_chars: usize,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            journal_chars: default_journal_chars(),
            session_chars: default_session_chars(),
        }
    }
}

fn default_journal_chars() -> usize {
    500
}
fn default_session_chars() -> usize {
    2000
}

impl Config {
    /// Defaulted config rooted at `root`, with the index under `<root>/.memex`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            vault: VaultConfig {
                root: root.to_path_buf(),
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
            db: DbConfig {
                path: root.join(".memex").join("memex.sqlite"),
            },
            retrieval: RetrievalConfig::default(),
            synthesis: SynthesisConfig::default(),
            scan: ScanConfig::default(),
            state: StateConfig::default(),
            truncation: TruncationConfig::default(),
        }
    }

    pub fn synthesis_dir(&self) -> PathBuf {
        self.synthesis
            .output_dir
            .clone()
            .unwrap_or_else(|| self.vault.root.join("synthesis"))
    }

    pub fn synthesis_index_path(&self) -> PathBuf {
        self.synthesis
            .index_path
            .clone()
            .unwrap_or_else(|| self.synthesis_dir().join("index.json"))
    }

    pub fn state_path(&self) -> PathBuf {
        self.state
            .path
            .clone()
            .unwrap_or_else(|| self.vault.root.join("state").join("work.json"))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.retrieval.final_limit < 1 {
        anyhow::bail!("retrieval.final_limit must be >= 1");
    }

    if config.synthesis.min_group_size == 0 {
        anyhow::bail!("synthesis.min_group_size must be >= 1");
    }

    if config.synthesis.vocabulary.iter().any(|t| t.trim().is_empty()) {
        anyhow::bail!("synthesis.vocabulary must not contain empty terms");
    }

    Ok(config)
}
