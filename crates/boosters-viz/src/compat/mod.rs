//! Compatibility layers for models trained by other frameworks.

pub mod lightgbm;
