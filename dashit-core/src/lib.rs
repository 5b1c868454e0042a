//! Core models for designing CRISPR guide libraries with dashit.
//!
//! This crate holds everything that describes *what* is being cut:
//!
//! - [`Sequence`](models::Sequence): a named nucleotide sequence
//! - [`Site`](models::Site): a 20-mer guide and the position it cuts
//! - [`SiteScanner`](scanner::SiteScanner): lazy enumeration of target sites on both strands
//! - [`Gene`](models::Gene) and [`Component`](models::Component): sequences cut by a designed
//!   library, their fragments, coverage and mutation-aware trimming
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashSet;
//! use dashit_core::models::{Gene, Sequence};
//!
//! let seq = Sequence::new("demo", b"TTACGATCGATCGATCGATCGTAGGTT").unwrap();
//! let mut gene = Gene::new("demo", seq);
//!
//! let library: HashSet<String> = gene.sequence.sites().map(|s| s.guide).collect();
//! gene.cut_with_library(&library);
//! assert_eq!(gene.cuts().unwrap().len(), 1);
//! ```

pub mod consts;
pub mod errors;
pub mod models;
pub mod scanner;
pub mod utils;

// re-exports
pub use errors::{GeneError, SequenceError};
pub use scanner::{SiteScanner, guide_at, scan_sites};
