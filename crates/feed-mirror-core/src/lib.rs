//! # Feed Mirror Core
//!
//! Shared, runtime-free logic for Feed Mirror: data models, text folding,
//! the structured query builder, feed payload parsing, reconciliation
//! planning, the store abstraction, and the search pipeline.
//!
//! This crate contains no tokio, sqlx, HTTP clients, or filesystem I/O.
//! The application crate supplies the concrete feed source, content
//! fetcher, and SQLite store, and drives the pipelines defined here.

pub mod error;
pub mod feed;
pub mod fold;
pub mod models;
pub mod query;
pub mod reconcile;
pub mod search;
pub mod snippet;
pub mod store;
