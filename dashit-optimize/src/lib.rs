//! Choosing CRISPR guide libraries.
//!
//! [guides] finds the smallest set of guides whose cut sites are no closer
//! than a minimum spacing and leave no gap wider than a maximum spacing,
//! phrased as a 0/1 integer program ([milp]) and solved by a pluggable
//! [milp::MilpSolver]. [reads] picks sites greedily by the reads they cover,
//! and [score] measures how many reads a finished library hits.
//!
//! # Example
//!
//! ```rust
//! use dashit_core::models::{Site, Strand};
//! use dashit_filter::{DesignConfig, FilterReasons};
//! use dashit_optimize::GuideOptimizer;
//!
//! let site = Site::new("GACTTCGAATGGCATCCTGA".to_string(), 100, Strand::Forward);
//! let optimizer = GuideOptimizer::new(DesignConfig::default());
//! let design = optimizer
//!     .optimize(&[vec![site]], &FilterReasons::default())
//!     .unwrap();
//!
//! assert_eq!(design.guides, vec!["GACTTCGAATGGCATCCTGA".to_string()]);
//! ```

pub mod backends;
pub mod errors;
pub mod guides;
pub mod milp;
pub mod reads;
pub mod score;

// re-exports
pub use backends::MicroLpSolver;
pub use errors::{OptimizeError, OptimizeResult};
pub use guides::{DesignViolation, GuideDesign, GuideOptimizer, verify_design};
pub use milp::{MilpModel, MilpSolution, MilpSolver, SolveStatus};
pub use reads::{ReadCoverPick, cover_reads_greedy};
pub use score::{GuideScorer, ReadHits};
