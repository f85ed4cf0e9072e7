//! Pipeline stages for the PRISM ingestion run.
//!
//! Each submodule implements exactly one transformation step. Keeping the
//! stages separate makes each independently testable and lets a stage swap
//! its mechanism (e.g. a different archive layout) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ archive ──▶ convert ──▶ convert ──▶ convert
//! (HTTP)    (unzip mdb)  (→sqlite)   (→csv)      (→json)
//! ```
//!
//! 1. [`fetch`]   — GET the archive, read the origin's version marker
//! 2. [`archive`] — locate and materialise the database entry; runs in
//!    `spawn_blocking` because inflate is CPU-bound
//! 3. [`convert`] — drive the three external converter subprocesses; the
//!    only stage that crosses a process boundary
//!
//! Publication to the blob store is sequenced by the orchestrator in
//! [`crate::ingest`], not by the stages themselves.

pub mod archive;
pub mod convert;
pub mod fetch;
