//! Filtering of CRISPR guide candidates.
//!
//! A candidate guide is excluded when it is structurally unreliable
//! ([structure]) or when an external `offtarget` server finds it within a
//! [Radius] of an unintended site ([offtarget]). Both checks produce
//! [FilterReasons], keyed by guide string, that are merged once before the
//! surviving guides go on to optimization.
//!
//! # Example
//!
//! ```rust
//! use dashit_filter::config::StructureParams;
//! use dashit_filter::exclude_guides;
//!
//! let guides = ["GACTTCGAATGGCATCCTGA", "AAAAAAAAAAAAAAAAAAAA"];
//! let reasons = exclude_guides(guides, &StructureParams::default(), None).unwrap();
//!
//! assert!(reasons.contains("AAAAAAAAAAAAAAAAAAAA"));
//! assert!(!reasons.contains("GACTTCGAATGGCATCCTGA"));
//! ```

pub mod config;
pub mod errors;
pub mod exclusions;
pub mod offtarget;
pub mod radius;
pub mod reasons;
pub mod sites_file;
pub mod structure;

// re-exports
pub use config::{DashitConfig, DesignConfig, OfftargetConfig, StructureParams};
pub use errors::{ConfigError, FilterError, OfftargetError};
pub use exclusions::{OfftargetCheck, exclude_guides};
pub use offtarget::{OfftargetClient, OfftargetMatcher, OfftargetServer};
pub use radius::Radius;
pub use reasons::FilterReasons;
pub use structure::poor_structure;
