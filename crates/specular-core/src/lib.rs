//! Specular reflectivity forward-model engine for stratified samples.
//!
//! The crate turns a flat fitted/fixed parameter vector plus a static
//! experiment description into per-contrast layer stacks, runs an Abeles
//! transfer-matrix recursion to predict reflected intensity, and aggregates a
//! chi-squared statistic across all contrasts under one of three
//! interchangeable dispatch strategies. External search drivers only ever see
//! the thin objective adapters in [`modules::objective`].

pub mod domain;
pub mod modules;
pub mod numerics;
pub mod setup;

pub use domain::{SpecularError, SpecularResult};
