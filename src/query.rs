use anyhow::{Context, Result};
use clap::ValueEnum;
use glob::Pattern;

use crate::records::{DatasetRecord, FileRecord};

/// One catalog lookup's keyword filters.
///
/// Unset fields contribute no query parameter at all; the service treats a
/// literal empty-string filter as a constraint, so `None` must never be
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetQuery {
    pub dataset: Option<String>,
    pub primary_ds_name: Option<String>,
    pub acquisition_era_name: Option<String>,
    pub data_tier_name: Option<String>,
    pub detail: bool,
}

impl DatasetQuery {
    /// Flattens the set fields into URL query parameters.
    pub fn as_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(v) = &self.dataset {
            params.push(("dataset", v.clone()));
        }
        if let Some(v) = &self.primary_ds_name {
            params.push(("primary_ds_name", v.clone()));
        }
        if let Some(v) = &self.acquisition_era_name {
            params.push(("acquisition_era_name", v.clone()));
        }
        if let Some(v) = &self.data_tier_name {
            params.push(("data_tier_name", v.clone()));
        }
        if self.detail {
            params.push(("detail", "true".to_string()));
        }
        params
    }
}

/// Read-only catalog lookups, implemented by [`crate::DbsClient`] and by the
/// mock catalog in tests.
pub trait Catalog {
    fn lookup_datasets(&self, query: &DatasetQuery) -> Result<Vec<DatasetRecord>>;
    fn lookup_files(&self, dataset: &str) -> Result<Vec<FileRecord>>;
}

/// Which record field drives output ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Lexicographic by dataset path.
    #[default]
    Name,
    /// Chronological by last modification date.
    Time,
}

/// Per-invocation query filters, built once from parsed arguments.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Explicit full dataset paths, `/primary/process/tier`.
    pub datasets: Vec<String>,
    pub primary_datasets: Vec<String>,
    pub acquisition_eras: Vec<String>,
    pub data_tiers: Vec<String>,
    /// Shell-style patterns matched client-side against `processed_ds_name`.
    ///
    /// Patterns alone (no other component filter) trigger one fully
    /// unconstrained lookup, fetching every dataset in the instance before
    /// narrowing.
    pub process_patterns: Vec<Pattern>,
    pub sort_order: SortOrder,
}

impl FilterSpec {
    /// Compiles raw pattern strings, failing before any network call on an
    /// invalid pattern.
    pub fn compile_patterns(raw: &[String]) -> Result<Vec<Pattern>> {
        raw.iter()
            .map(|p| Pattern::new(p).with_context(|| format!("invalid process name pattern `{}`", p)))
            .collect()
    }

    fn has_component_filters(&self) -> bool {
        !self.primary_datasets.is_empty()
            || !self.acquisition_eras.is_empty()
            || !self.process_patterns.is_empty()
            || !self.data_tiers.is_empty()
    }
}

/// Looks up datasets per `filters` and returns their full paths in print
/// order.
///
/// Explicit-name lookups and component-filter lookups are independent query
/// paths; each contributes its own sorted block, with no deduplication
/// between them.
pub fn list_datasets(catalog: &impl Catalog, filters: &FilterSpec) -> Result<Vec<String>> {
    let mut out = Vec::new();

    if !filters.datasets.is_empty() {
        let mut records = Vec::new();
        for dataset in &filters.datasets {
            let query = DatasetQuery {
                dataset: Some(dataset.clone()),
                detail: true,
                ..Default::default()
            };
            records.extend(catalog.lookup_datasets(&query)?);
        }
        sort_records(&mut records, filters.sort_order);
        out.extend(records.into_iter().map(|r| r.dataset));
    }

    if filters.has_component_filters() {
        let mut records = Vec::new();
        for query in component_queries(filters) {
            records.extend(catalog.lookup_datasets(&query)?);
        }
        if !filters.process_patterns.is_empty() {
            records.retain(|r| {
                filters
                    .process_patterns
                    .iter()
                    .any(|p| p.matches(&r.processed_ds_name))
            });
        }
        sort_records(&mut records, filters.sort_order);
        out.extend(records.into_iter().map(|r| r.dataset));
    }

    Ok(out)
}

/// Looks up files for each dataset and returns logical file names sorted
/// lexicographically.
pub fn list_files(catalog: &impl Catalog, datasets: &[String]) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for dataset in datasets {
        files.extend(catalog.lookup_files(dataset)?);
    }
    let mut names: Vec<String> = files.into_iter().map(|f| f.logical_file_name).collect();
    names.sort();
    Ok(names)
}

/// Cartesian product of the filterable dimensions in fixed order
/// (primary, era, tier). An unspecified dimension contributes exactly one
/// unconstrained combination.
fn component_queries(filters: &FilterSpec) -> Vec<DatasetQuery> {
    let mut queries = Vec::new();
    for pd in constraint_axis(&filters.primary_datasets) {
        for ae in constraint_axis(&filters.acquisition_eras) {
            for dt in constraint_axis(&filters.data_tiers) {
                queries.push(DatasetQuery {
                    dataset: None,
                    primary_ds_name: pd.map(str::to_string),
                    acquisition_era_name: ae.map(str::to_string),
                    data_tier_name: dt.map(str::to_string),
                    detail: true,
                });
            }
        }
    }
    queries
}

fn constraint_axis(values: &[String]) -> Vec<Option<&str>> {
    if values.is_empty() {
        vec![None]
    } else {
        // An empty string still counts as a combination but must not be
        // sent as a literal empty-string filter.
        values
            .iter()
            .map(|v| if v.is_empty() { None } else { Some(v.as_str()) })
            .collect()
    }
}

fn sort_records(records: &mut [DatasetRecord], order: SortOrder) {
    // Both sorts are stable; ties keep accumulation order.
    match order {
        SortOrder::Name => records.sort_by(|a, b| a.dataset.cmp(&b.dataset)),
        SortOrder::Time => records.sort_by_key(|r| r.last_modification_date),
    }
}
