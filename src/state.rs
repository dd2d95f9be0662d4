//! Work-continuity state.
//!
//! A small JSON document that carries context between working sessions:
//! the projects in flight, the open items, and a summary of the last
//! session. It is read whole, modified, and rewritten whole. There is no
//! locking; the last writer wins.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::config::Config;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkState {
    #[serde(default)]
    pub active_projects: Vec<String>,
    #[serde(default)]
    pub last_session: Option<LastSession>,
    #[serde(default)]
    pub open_items: Vec<OpenItem>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastSession {
    /// YYYY-MM-DD
    pub date: String,
    pub summary: String,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_modified: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenItem {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl WorkState {
    /// Load state. Missing yields the default; so does a corrupt file, which
    /// is left in place until the next save overwrites it.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "work state is corrupt, starting fresh");
                Self::default()
            }
        }
    }

    /// Write the state, stamping `lastUpdated`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.last_updated = Some(Utc::now());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write work state: {}", path.display()))?;
        Ok(())
    }

    /// Returns false if the project was already active.
    pub fn add_project(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.active_projects.iter().any(|p| p == name) {
            return false;
        }
        self.active_projects.push(name.to_string());
        true
    }

    /// Returns false if the project was not active.
    pub fn remove_project(&mut self, name: &str) -> bool {
        let before = self.active_projects.len();
        self.active_projects.retain(|p| p != name.trim());
        self.active_projects.len() != before
    }

    pub fn add_item(&mut self, description: &str, priority: Option<String>, context: Option<String>) {
        self.open_items.push(OpenItem {
            description: description.to_string(),
            priority,
            created_at: Utc::now(),
            context,
        });
    }

    /// Remove the open item at `index` (0-based) and return it.
    pub fn resolve_item(&mut self, index: usize) -> Result<OpenItem> {
        if index >= self.open_items.len() {
            bail!(
                "No open item at index {} ({} open)",
                index,
                self.open_items.len()
            );
        }
        Ok(self.open_items.remove(index))
    }

    pub fn record_session(&mut self, session: LastSession) {
        self.last_session = Some(session);
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("Active projects:\n");
        if self.active_projects.is_empty() {
            out.push_str("  (none)\n");
        }
        for p in &self.active_projects {
            out.push_str(&format!("  - {}\n", p));
        }

        out.push_str("\nOpen items:\n");
        if self.open_items.is_empty() {
            out.push_str("  (none)\n");
        }
        for (i, item) in self.open_items.iter().enumerate() {
            let priority = item
                .priority
                .as_deref()
                .map(|p| format!(" [{}]", p))
                .unwrap_or_default();
            out.push_str(&format!("  {}.{} {}\n", i, priority, item.description));
            if let Some(ctx) = &item.context {
                out.push_str(&format!("      context: {}\n", ctx));
            }
        }

        out.push_str("\nLast session:\n");
        match &self.last_session {
            None => out.push_str("  (none)\n"),
            Some(s) => {
                out.push_str(&format!("  {}: {}\n", s.date, s.summary));
                for step in &s.next_steps {
                    out.push_str(&format!("  next: {}\n", step));
                }
                if let Some(files) = &s.files_modified {
                    out.push_str(&format!("  files: {}\n", files.join(", ")));
                }
            }
        }

        if let Some(ts) = self.last_updated {
            out.push_str(&format!("\nUpdated: {}\n", ts.format("%Y-%m-%d %H:%M")));
        }
        out
    }
}

/// Validate a session date, returning it normalized as YYYY-MM-DD.
pub fn parse_session_date(s: &str) -> Result<String> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid session date '{}': expected YYYY-MM-DD", s))?;
    Ok(date.to_string())
}

/// A mutation requested from the CLI.
#[derive(Debug, Clone)]
pub enum StateAction {
    Show,
    AddProject(String),
    RemoveProject(String),
    AddItem {
        description: String,
        priority: Option<String>,
        context: Option<String>,
    },
    ResolveItem(usize),
    Session(LastSession),
}

/// CLI entry point for `memex state`.
pub fn run_state(config: &Config, action: StateAction) -> Result<()> {
    let path = config.state_path();
    let mut state = WorkState::load(&path);

    match action {
        StateAction::Show => {
            print!("{}", state.render());
            return Ok(());
        }
        StateAction::AddProject(name) => {
            if !state.add_project(&name) {
                println!("project already active: {}", name);
                return Ok(());
            }
            println!("added project: {}", name);
        }
        StateAction::RemoveProject(name) => {
            if !state.remove_project(&name) {
                println!("project not active: {}", name);
                return Ok(());
            }
            println!("removed project: {}", name);
        }
        StateAction::AddItem {
            description,
            priority,
            context,
        } => {
            state.add_item(&description, priority, context);
            println!("added item {}: {}", state.open_items.len() - 1, description);
        }
        StateAction::ResolveItem(index) => {
            let item = state.resolve_item(index)?;
            println!("resolved: {}", item.description);
        }
        StateAction::Session(session) => {
            println!("recorded session {}", session.date);
            state.record_session(session);
        }
    }

    state.save(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn projects_are_not_duplicated() {
        let mut state = WorkState::default();
        assert!(state.add_project("memex"));
        assert!(!state.add_project("memex"));
        assert_eq!(state.active_projects, vec!["memex"]);
        assert!(state.remove_project("memex"));
        assert!(!state.remove_project("memex"));
    }

    #[test]
    fn resolve_out_of_range_is_an_error() {
        let mut state = WorkState::default();
        state.add_item("write docs", None, None);
        assert!(state.resolve_item(1).is_err());
        assert_eq!(state.resolve_item(0).unwrap().description, "write docs");
        assert!(state.open_items.is_empty());
    }

    #[test]
    fn session_dates_are_validated() {
        assert_eq!(parse_session_date("2026-10-19").unwrap(), "2026-10-19");
        assert!(parse_session_date("yesterday").is_err());
    }

    #[test]
    fn corrupt_file_loads_as_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("work.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(WorkState::load(&path), WorkState::default());
    }

    #[test]
    fn save_stamps_and_uses_camel_case() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state/work.json");
        let mut state = WorkState::default();
        state.add_project("memex");
        state.record_session(LastSession {
            date: "2026-10-19".to_string(),
            summary: "wired up scan mode".to_string(),
            next_steps: vec!["write docs".to_string()],
            files_modified: None,
        });
        state.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"activeProjects\""));
        assert!(raw.contains("\"nextSteps\""));
        assert!(raw.contains("\"lastUpdated\""));
        assert!(!raw.contains("filesModified"));

        let loaded = WorkState::load(&path);
        assert!(loaded.last_updated.is_some());
        assert_eq!(loaded.active_projects, vec!["memex"]);
    }

    #[test]
    fn reads_documents_with_optional_fields_missing() {
        let json = r#"{"activeProjects":["a"],"openItems":[{"description":"x","createdAt":"2026-10-01T00:00:00Z"}]}"#;
        let state: WorkState = serde_json::from_str(json).unwrap();
        assert_eq!(state.open_items[0].priority, None);
        assert!(state.last_session.is_none());
    }
}
