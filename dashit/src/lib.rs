//! CRISPR guide library design.
//!
//! Each part lives in its own crate and is re-exported here behind a
//! feature of the same name:
//!
//! - `core`: sequences, target sites, genes and libraries
//! - `filter`: structural and off-target filtering of candidate guides
//! - `optimize`: minimum guide libraries, greedy read cover and scoring

#[cfg(feature = "core")]
#[doc(inline)]
pub use dashit_core as core;

#[cfg(feature = "filter")]
#[doc(inline)]
pub use dashit_filter as filter;

#[cfg(feature = "optimize")]
#[doc(inline)]
pub use dashit_optimize as optimize;
