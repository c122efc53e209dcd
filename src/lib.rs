//! # Preach Point
//!
//! Bible passage service: resolves a book / chapter / verse range against a
//! static verse document, and serves the passage text, an Afrikaans
//! translation, or an AI-generated commentary over a JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────────┐
//! │ kjv.json   │──▶│ VerseStore  │──▶│  extract_verses  │
//! └────────────┘   └─────────────┘   └────────┬─────────┘
//!                                             │
//!                         ┌───────────────────┤
//!                         ▼                   ▼
//!                  ┌─────────────┐     ┌──────────────┐
//!                  │ PassageSvc  │────▶│  Completion  │
//!                  │ + TtlCache  │     │  (OpenAI)    │
//!                  └──────┬──────┘     └──────────────┘
//!                         ▼
//!                ┌─────────────────┐
//!                │ CLI / HTTP API  │
//!                └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! preach books
//! preach passage Genesis 1:31 2:2
//! preach serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Book / chapter / verse types |
//! | [`store`] | Read-only verse store |
//! | [`extract`] | Verse range extraction |
//! | [`reference`] | `C:V` location parsing |
//! | [`cache`] | TTL response cache |
//! | [`completion`] | Chat-completion providers |
//! | [`passage`] | Translation and commentary workflows |
//! | [`server`] | HTTP API |

pub mod cache;
pub mod completion;
pub mod config;
pub mod extract;
pub mod models;
pub mod passage;
pub mod reference;
pub mod server;
pub mod store;
