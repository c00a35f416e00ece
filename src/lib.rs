//! reldb - an in-memory relational algebra engine in Rust
//!
//! This crate provides typed relations with:
//! - Schema-checked tuple storage and composite-key indexing
//! - The classic operator family: project, select, union, minus and
//!   three join strategies, each producing a fresh relation
//! - Three interchangeable index backends (ordered map, linear hashing,
//!   B+-tree) behind a single capability contract
//! - Whole-relation persistence to opaque blobs

pub mod catalog;
pub mod error;
pub mod generate;
pub mod index;
pub mod relation;
pub mod storage;
