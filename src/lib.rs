//! # memex
//!
//! A local knowledge vault toolkit: indexes markdown notes ("memories"),
//! searches them, and distills each week into a pattern report.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │    Vault    │──▶│   Ingest    │──▶│  SQLite  │──▶ search (index)
//! │  markdown   │   │  extract    │   │   FTS5   │
//! └──────┬──────┘   └─────────────┘   └──────────┘
//!        │
//!        ├──────────────────────────────────────────▶ search (scan)
//!        │
//!        ▼
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  keywords   │──▶│  patterns   │──▶│  report  │──▶ synthesis index
//! └─────────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! memex init
//! memex sync
//! memex search "connection pool"
//! memex search "retry|backoff" --mode scan
//! memex synthesize --date 2026-10-14
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Categories, memories, search hits |
//! | [`extract`] | Title, date, rating, and tag extraction |
//! | [`vault`] | Vault enumeration and memory loading |
//! | [`keywords`] | Theme keywords per memory |
//! | [`patterns`] | Keyword grouping and insights |
//! | [`report`] | Weekly report rendering |
//! | [`synthesis`] | Weekly synthesis pipeline and durable index |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`store`] | Index store trait and backends |
//! | [`ingest`] | Vault → index sync |
//! | [`progress`] | Sync progress reporting |
//! | [`search`] | Index and scan search entry points |
//! | [`scan`] | Linear search over raw files |
//! | [`get`] | Memory retrieval by identity |
//! | [`stats`] | Index statistics |
//! | [`state`] | Work-continuity state |

pub mod config;
pub mod db;
pub mod extract;
pub mod get;
pub mod ingest;
pub mod keywords;
pub mod migrate;
pub mod models;
pub mod patterns;
pub mod progress;
pub mod report;
pub mod scan;
pub mod search;
pub mod state;
pub mod stats;
pub mod store;
pub mod synthesis;
pub mod vault;
