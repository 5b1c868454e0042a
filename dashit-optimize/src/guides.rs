//! Minimum guide library selection.
//!
//! One binary variable per distinct surviving guide, minimizing the number
//! of guides chosen, subject to:
//!
//! - spacing: sites of one sequence whose cuts are closer than
//!   `min_spacing` may not both be selected. For every site, the sites
//!   cutting in `[cut, cut + min_spacing)` are pairwise too close, so at most
//!   one of their guides is chosen.
//! - coverage: for every site, at least one guide is chosen among the sites
//!   cutting less than `max_spacing` away from it, the site itself included.
//!
//! Identical constraints are only added once.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use dashit_core::models::Site;
use dashit_filter::{DesignConfig, FilterReasons};

use crate::backends::MicroLpSolver;
use crate::errors::{OptimizeError, OptimizeResult};
use crate::milp::{MilpModel, MilpSolver, Sense, SolveStatus, VarId};

///
/// The integer program for one design problem, along with the guide each
/// variable stands for.
///
#[derive(Debug, Clone)]
pub struct GuideModel {
    pub model: MilpModel,
    /// `guides[i]` is the guide behind `VarId(i)`, in sorted order
    pub guides: Vec<String>,
    pub spacing_constraints: usize,
    pub coverage_constraints: usize,
}

///
/// A selected guide library.
///
#[derive(PartialEq, Debug, Clone)]
pub struct GuideDesign {
    /// sorted
    pub guides: Vec<String>,
    pub status: SolveStatus,
    pub candidate_guides: usize,
    pub spacing_constraints: usize,
    pub coverage_constraints: usize,
}

impl GuideDesign {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum DesignViolation {
    TooClose {
        sequence: usize,
        first: Site,
        second: Site,
    },
    Uncovered {
        sequence: usize,
        site: Site,
    },
    ExcludedGuide(String),
}

///
/// Surviving sites of every sequence, sorted by cut.
///
fn surviving_sites<'a, T: AsRef<[Site]>>(
    targets: &'a [T],
    excluded: &FilterReasons,
) -> Vec<Vec<&'a Site>> {
    targets
        .iter()
        .map(|sites| {
            let mut kept: Vec<&'a Site> = sites
                .as_ref()
                .iter()
                .filter(|s| !excluded.contains(&s.guide))
                .collect();
            kept.sort_by_key(|s| s.cut);
            kept
        })
        .collect()
}

pub struct GuideOptimizer<S: MilpSolver = MicroLpSolver> {
    config: DesignConfig,
    solver: S,
}

impl GuideOptimizer<MicroLpSolver> {
    pub fn new(config: DesignConfig) -> Self {
        GuideOptimizer {
            config,
            solver: MicroLpSolver,
        }
    }
}

impl<S: MilpSolver> GuideOptimizer<S> {
    pub fn with_solver(config: DesignConfig, solver: S) -> Self {
        GuideOptimizer { config, solver }
    }

    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    ///
    /// Build the integer program for the sites of every sequence, ignoring
    /// every guide in `excluded`.
    ///
    pub fn build_model<T: AsRef<[Site]>>(
        &self,
        targets: &[T],
        excluded: &FilterReasons,
    ) -> OptimizeResult<GuideModel> {
        let surviving = surviving_sites(targets, excluded);

        let guides: Vec<String> = surviving
            .iter()
            .flatten()
            .map(|s| s.guide.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if guides.is_empty() {
            return Err(OptimizeError::NoCandidateSites);
        }

        let mut model = MilpModel::new();
        let vars: BTreeMap<&str, VarId> = guides
            .iter()
            .map(|g| (g.as_str(), model.add_binary()))
            .collect();

        let mut spacing: BTreeSet<Vec<VarId>> = BTreeSet::new();
        let mut coverage: BTreeSet<Vec<VarId>> = BTreeSet::new();

        for sites in surviving.iter() {
            for site in sites.iter() {
                let near: BTreeSet<VarId> = sites
                    .iter()
                    .filter(|other| {
                        other.cut >= site.cut && other.cut - site.cut < self.config.min_spacing
                    })
                    .map(|other| vars[other.guide.as_str()])
                    .collect();
                if near.len() > 1 {
                    spacing.insert(near.into_iter().collect());
                }

                let far: BTreeSet<VarId> = sites
                    .iter()
                    .filter(|other| other.cut.abs_diff(site.cut) < self.config.max_spacing)
                    .map(|other| vars[other.guide.as_str()])
                    .collect();
                coverage.insert(far.into_iter().collect());
            }
        }

        let ones = |set: &Vec<VarId>| set.iter().map(|v| (*v, 1.0)).collect::<Vec<_>>();
        for set in spacing.iter() {
            model.add_constraint(None, Some(1.0), ones(set));
        }
        for set in coverage.iter() {
            model.add_constraint(Some(1.0), None, ones(set));
        }
        model.set_objective(Sense::Minimize, vars.values().map(|v| (*v, 1.0)).collect());

        info!(
            "{} candidate guides, {} spacing and {} coverage constraints",
            guides.len(),
            spacing.len(),
            coverage.len()
        );

        Ok(GuideModel {
            model,
            guides,
            spacing_constraints: spacing.len(),
            coverage_constraints: coverage.len(),
        })
    }

    ///
    /// Select the fewest guides that satisfy the spacing and coverage
    /// constraints.
    ///
    /// Fails with [OptimizeError::NoCandidateSites] when every site was
    /// excluded and [OptimizeError::Infeasible] when no selection satisfies
    /// the constraints. A solution the solver could not prove optimal is
    /// returned with [SolveStatus::Feasible].
    ///
    pub fn optimize<T: AsRef<[Site]>>(
        &self,
        targets: &[T],
        excluded: &FilterReasons,
    ) -> OptimizeResult<GuideDesign> {
        let guide_model = self.build_model(targets, excluded)?;
        let solution = self.solver.solve(&guide_model.model)?;

        let guides: Vec<String> = guide_model
            .guides
            .iter()
            .enumerate()
            .filter(|(i, _)| solution.is_set(VarId(*i)))
            .map(|(_, g)| g.clone())
            .collect();

        match solution.status {
            SolveStatus::Optimal => info!("Solution is OPTIMAL: {} guides", guides.len()),
            SolveStatus::Feasible => warn!("Solution may be SUB-OPTIMAL: {} guides", guides.len()),
        }

        Ok(GuideDesign {
            guides,
            status: solution.status,
            candidate_guides: guide_model.guides.len(),
            spacing_constraints: guide_model.spacing_constraints,
            coverage_constraints: guide_model.coverage_constraints,
        })
    }
}

///
/// Check a selected library against the design rules directly on the
/// sites, independent of any model.
///
/// Two sites of the same guide can't be told apart by the optimizer, so
/// only sites of different guides are checked for spacing.
///
pub fn verify_design<T: AsRef<[Site]>>(
    targets: &[T],
    excluded: &FilterReasons,
    guides: &[String],
    config: &DesignConfig,
) -> Vec<DesignViolation> {
    let selected: BTreeSet<&str> = guides.iter().map(String::as_str).collect();
    let mut violations: Vec<DesignViolation> = selected
        .iter()
        .filter(|g| excluded.contains(g))
        .map(|g| DesignViolation::ExcludedGuide(g.to_string()))
        .collect();

    for (sequence, sites) in surviving_sites(targets, excluded).iter().enumerate() {
        let chosen: Vec<&Site> = sites
            .iter()
            .copied()
            .filter(|s| selected.contains(s.guide.as_str()))
            .collect();

        for (i, first) in chosen.iter().enumerate() {
            for second in chosen[i + 1..].iter() {
                if first.guide != second.guide && second.cut - first.cut < config.min_spacing {
                    violations.push(DesignViolation::TooClose {
                        sequence,
                        first: (*first).clone(),
                        second: (*second).clone(),
                    });
                }
            }
        }

        for site in sites.iter() {
            if !chosen
                .iter()
                .any(|c| c.cut.abs_diff(site.cut) < config.max_spacing)
            {
                violations.push(DesignViolation::Uncovered {
                    sequence,
                    site: (*site).clone(),
                });
            }
        }
    }

    violations
}
