use std::collections::HashSet;

use crate::errors::{GeneError, GeneResult};
use crate::models::Gene;

///
/// A group of genes that share one designed guide library.
///
/// The library can be restricted to the guides cutting a subset of genes and
/// trimmed to a fixed number of cuts per gene.
///
#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub genes: Vec<Gene>,
    library: Option<HashSet<String>>,
}

impl Component {
    pub fn new(genes: Vec<Gene>) -> Self {
        let first = genes.first().map_or("empty", |g| g.name.as_str());
        let name = format!("{}-comp-{}", first, genes.len());
        Component {
            name,
            genes,
            library: None,
        }
    }

    ///
    /// Assign the library and cut every gene with it.
    ///
    pub fn set_library(&mut self, library: HashSet<String>) {
        for gene in self.genes.iter_mut() {
            gene.cut_with_library(&library);
        }
        self.library = Some(library);
    }

    pub fn library(&self) -> Option<&HashSet<String>> {
        self.library.as_ref()
    }

    pub fn gene_names(&self) -> Vec<&str> {
        self.genes.iter().map(|g| g.name.as_str()).collect()
    }

    ///
    /// Guides cutting the selected genes, restricted to the selected guides.
    ///
    /// `None` selects everything. The result is sorted and must be contained
    /// in the component's library; anything else is a
    /// [GeneError::LibraryInvariant].
    ///
    pub fn subset_library(
        &self,
        gene_subset: Option<&HashSet<String>>,
        guide_subset: Option<&HashSet<String>>,
    ) -> GeneResult<Vec<String>> {
        let library = self
            .library
            .as_ref()
            .ok_or_else(|| GeneError::MissingLibrary(self.name.clone()))?;

        let mut sub_library: HashSet<&str> = HashSet::new();
        for gene in self.genes.iter() {
            if gene_subset.is_some_and(|s| !s.contains(&gene.name)) {
                continue;
            }
            for site in gene.cuts.iter().flatten() {
                if guide_subset.is_none_or(|s| s.contains(&site.guide)) {
                    sub_library.insert(site.guide.as_str());
                }
            }
        }

        let mut outside: Vec<String> = sub_library
            .iter()
            .filter(|&&g| !library.contains(g))
            .map(|g| g.to_string())
            .collect();
        if !outside.is_empty() {
            outside.sort();
            return Err(GeneError::LibraryInvariant {
                component: self.name.clone(),
                guides: outside,
            });
        }

        let mut sub_library: Vec<String> = sub_library.into_iter().map(String::from).collect();
        sub_library.sort();
        Ok(sub_library)
    }

    ///
    /// Trim the library, keeping the first `n_cuts` cuts of every gene in
    /// scope. Genes carrying mutation ranges keep all of their cuts.
    ///
    pub fn trim_library(&self, n_cuts: usize, gene_subset: Option<&HashSet<String>>) -> Vec<String> {
        let mut guides: HashSet<&str> = HashSet::new();

        for gene in self.genes.iter() {
            if gene_subset.is_some_and(|s| !s.contains(&gene.name)) {
                continue;
            }
            let cuts = match gene.cuts.as_deref() {
                Some(cuts) if !cuts.is_empty() => cuts,
                _ => continue,
            };
            let keep = if gene.has_snps() {
                cuts.len()
            } else {
                n_cuts.min(cuts.len())
            };
            guides.extend(cuts[..keep].iter().map(|site| site.guide.as_str()));
        }

        let mut guides: Vec<String> = guides.into_iter().map(String::from).collect();
        guides.sort();
        guides
    }
}

///
/// Pull out the trimmed guides for `gene_names` from every component.
///
/// Returns the guides along with the requested genes that belong to a
/// component whose subset came back empty.
///
pub fn subset(
    components: &[Component],
    gene_names: &HashSet<String>,
    n_cuts: usize,
) -> GeneResult<(Vec<String>, HashSet<String>)> {
    let mut results = Vec::new();
    let mut unsolved = HashSet::new();

    for component in components {
        let trimmed: HashSet<String> = component
            .trim_library(n_cuts, Some(gene_names))
            .into_iter()
            .collect();
        let c_subset = component.subset_library(Some(gene_names), Some(&trimmed))?;
        if c_subset.is_empty() {
            unsolved.extend(
                component
                    .gene_names()
                    .into_iter()
                    .filter(|name| gene_names.contains(*name))
                    .map(String::from),
            );
        }
        results.extend(c_subset);
    }

    Ok((results, unsolved))
}
