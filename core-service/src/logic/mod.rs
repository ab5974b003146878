//! Logic Module - Feature Pipeline & Scoring Engines
//!
//! - `features/` - Feature extraction, schema, vector assembly
//! - `model/` - Classifier inference and risk tiers
//! - `dataset/` - Offline corpus extraction for training
//! - `fetch` - Page content retrieval (the only networked step)
//! - `engine` - Artifact loading, compatibility checks, `predict`

pub mod config;
pub mod error;
pub mod fetch;
pub mod engine;

pub mod features;
pub mod model;
pub mod dataset;
