//! Search pipeline facade.
//!
//! One request makes a strict linear pass: resolve inputs → select
//! strategy → [filter] → rank (one or two modalities) → [fuse] → return.
//! The pieces:
//!
//! - **[`keywords`]**: keyword extraction contract + the built-in Unicode
//!   extractor feeding the location filter.
//! - **[`location_filter`]**: keyword/location substring narrowing with a
//!   full-catalog fallback.
//! - **[`ranker`]**: cosine-similarity scoring of candidates against one
//!   modality's feature table.
//! - **[`fusion`]**: weighted merge of the two per-modality rankings, plus
//!   top-N slices at fixed comparison weights.
//! - **[`pipeline`]**: the orchestrator tying providers and stages
//!   together, including fallback generation for a missing modality.

pub mod fusion;
pub mod keywords;
pub mod location_filter;
pub mod pipeline;
pub mod ranker;
