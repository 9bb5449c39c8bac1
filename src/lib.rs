//! # Feed Mirror
//!
//! Keeps a searchable local article store in sync with a paginated remote
//! feed, and serves ranked, diacritic-insensitive full-text search over it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Feed pages  │──▶│ Reconciler  │──▶│  SQLite   │
//! │ + articles  │   │ plan+apply  │   │ rows+FTS5 │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │ (fmirror)│       │  search  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! Runtime-free logic (feed parsing, sync planning, query building,
//! snippets, the search pipeline) lives in `feed-mirror-core`; this crate
//! supplies the SQLite store, HTTP collaborators, CLI, and server.
//!
//! ## Quick Start
//!
//! ```bash
//! fmirror init                  # create database
//! fmirror sync                  # mirror the feed
//! fmirror search "cà phê"       # search
//! fmirror serve                 # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | `ArticleStore` over SQLite + FTS5 |
//! | [`feed_reader`] | Paginated feed reading with retry |
//! | [`content`] | Article page download and text extraction |
//! | [`sync`] | Reconcile run driver and report |
//! | [`search`] | CLI search |
//! | [`get`] | CLI article lookup |
//! | [`stats`] | CLI database summary |
//! | [`server`] | Search HTTP server |

pub mod config;
pub mod content;
pub mod db;
pub mod feed_reader;
pub mod get;
pub mod migrate;
pub mod search;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod sync;
