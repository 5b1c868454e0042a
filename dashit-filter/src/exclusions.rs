use tracing::info;

use crate::config::StructureParams;
use crate::errors::FilterResult;
use crate::offtarget::{OfftargetMatcher, offtarget_reasons};
use crate::radius::Radius;
use crate::reasons::FilterReasons;
use crate::structure::structural_reasons;

///
/// An off-target server to check guides against, the radii to check and the
/// name of the off-target sites file, used in the exclusion reason.
///
pub struct OfftargetCheck<'a> {
    pub matcher: &'a dyn OfftargetMatcher,
    pub radii: &'a [Radius],
    pub source: &'a str,
}

///
/// Decide which candidate guides to exclude and why.
///
/// The structural and off-target checks run independently over the distinct
/// guides and are merged once, so neither depends on the other's outcome.
///
pub fn exclude_guides<'a, I>(
    guides: I,
    params: &StructureParams,
    offtarget: Option<&OfftargetCheck<'_>>,
) -> FilterResult<FilterReasons>
where
    I: IntoIterator<Item = &'a str>,
{
    let guides: Vec<&str> = guides.into_iter().collect();

    let structural = structural_reasons(guides.iter().copied(), params);
    let offtargets = match offtarget {
        Some(check) => {
            offtarget_reasons(check.matcher, guides.iter().copied(), check.radii, check.source)?
        }
        None => {
            info!("no off-target file given, skipping off-target filtering");
            FilterReasons::new()
        }
    };

    let reasons = structural.union(offtargets);
    info!("excluding {} distinct guides", reasons.len());
    Ok(reasons)
}
