//! # Database Crate
//!
//! Persistence for journal trades. Everything above this crate talks to a
//! `TradeRepository`; the concrete store is chosen at startup.
//!
//! ## Architectural Principles
//!
//! - **Per-user scoping:** every read, write and subscription names the user
//!   it acts for. Records owned by anyone else are invisible.
//! - **Lifecycle at the write:** the active-to-closed transition is checked
//!   atomically with the write, so a closed trade can never be modified.
//! - **Live views:** `subscribe` hands back an owned `Subscription` that
//!   receives the full matching collection after every change.
//!
//! ## Public API
//!
//! - `TradeRepository`: the storage trait.
//! - `MemoryRepository`: an in-process store, used when no database is configured.
//! - `PgRepository`: the PostgreSQL store.
//! - `connect` / `run_migrations`: pool setup for `PgRepository`.
//! - `TradeQuery`, `TradeOrder`, `Subscription`, `DbError`.

pub mod connection;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod subscription;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use query::{TradeOrder, TradeQuery};
pub use repository::TradeRepository;
pub use subscription::Subscription;
