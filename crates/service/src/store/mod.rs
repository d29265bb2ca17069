//! Store module: three-layer architecture (domain, repository, service).
//!
//! Registration, lookup, partial update and listing of stores. Stores are
//! soft-deleted through their status and never physically removed.

pub mod domain;
pub mod errors;
pub mod geo;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{StoreConfig, StoreService};
