//! Per-entity request-parameter filters.
//!
//! One filter per entity interprets the recognized request parameters
//! and populates either a relational [Statement] or a document-path
//! [DocumentFilter]. Filters compose across joins: a parent filter
//! declares the join and absorbs the child filter's output via
//! `combine`, so nested filtering is never duplicated.
//!
//! Root-only predicates (raw id equality) are skipped when the entity
//! is reached through a join from a parent.

mod episode;
mod genre;
mod series;
mod studio;

pub mod document;

pub use episode::EpisodeFilter;
pub use genre::GenreFilter;
pub use series::SeriesFilter;
pub use studio::StudioFilter;

use rand::RngCore;
use tracing::{debug, warn};

use crate::entities::EntityMeta;
use crate::error::QueryError;
use crate::params::RequestParams;
use crate::sortable::{find_by_name, resolve_sortable};
use crate::statement::pipeline::DocumentFilter;
use crate::statement::{SortOrder, Statement};

/// Relational-path filter: builds a [Statement] from request parameters.
pub trait EntityFilter {
    /// The entity this filter targets.
    fn entity(&self) -> &'static EntityMeta;

    /// Interpret `params` into a statement. `is_root` is false when the
    /// entity is reached via a join from a parent filter; `rng` seeds
    /// the statement's random order.
    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, QueryError>;
}

/// Document-path filter: builds match expressions and pipeline stages.
pub trait DocumentEntityFilter {
    /// Collection the pipeline runs against.
    fn collection(&self) -> &'static str;

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
    ) -> Result<DocumentFilter, QueryError>;
}

/// True when any of `keys` has a non-empty value.
pub(crate) fn has_any(params: &RequestParams, keys: &[&str]) -> bool {
    keys.iter().any(|key| params.first(key).is_some())
}

/// Apply the request's sort selection to a relational statement.
///
/// An unknown field name skips the sort entirely (logged, not an
/// error). For ASC/DESC a present cursor adds the continuation
/// inequality on the sort field; RANDOM never takes a cursor.
pub(crate) fn apply_sort(stmt: &mut Statement, params: &RequestParams) -> Result<(), QueryError> {
    let Some((field, order)) = params.sort() else {
        return Ok(());
    };
    let descriptors = resolve_sortable(stmt.entity());
    let Some(descriptor) = find_by_name(descriptors, field) else {
        debug!(field, "sort field not sortable, skipping sort");
        return Ok(());
    };

    match order {
        SortOrder::Random => {
            if params.cursor().is_some() {
                warn!(field, "cursor ignored for random order");
            }
            stmt.set_random_order();
        }
        SortOrder::Ascending | SortOrder::Descending => {
            if let Some(cursor) = params.cursor() {
                let value = descriptor.cast_value(cursor)?;
                let op = if order == SortOrder::Ascending {
                    ">="
                } else {
                    "<="
                };
                let path = stmt.qualify_path(&descriptor.path);
                stmt.add_clause(format!("{path} {op} ?"), vec![value]);
            }
            stmt.set_sort(descriptor.path.clone(), order);
        }
        SortOrder::None => {
            debug!(field, "no usable sort order, skipping sort");
        }
    }
    Ok(())
}

/// Document-path counterpart of [apply_sort]: the continuation
/// inequality becomes a match expression, the sort selection is stored
/// on the filter for the pipeline builder.
pub(crate) fn apply_document_sort(
    filter: &mut DocumentFilter,
    params: &RequestParams,
    meta: &'static EntityMeta,
) -> Result<(), QueryError> {
    let Some((field, order)) = params.sort() else {
        return Ok(());
    };
    let descriptors = resolve_sortable(meta);
    let Some(descriptor) = find_by_name(descriptors, field) else {
        debug!(field, "sort field not sortable, skipping sort");
        return Ok(());
    };

    match order {
        SortOrder::Random => {
            if params.cursor().is_some() {
                warn!(field, "cursor ignored for random order");
            }
            filter.set_random_order();
        }
        SortOrder::Ascending | SortOrder::Descending => {
            if let Some(cursor) = params.cursor() {
                let value = descriptor.cast_value(cursor)?;
                let op = if order == SortOrder::Ascending {
                    "$gte"
                } else {
                    "$lte"
                };
                let mut bound = serde_json::Map::new();
                bound.insert(op.to_string(), value.to_json());
                let mut expr = serde_json::Map::new();
                expr.insert(descriptor.path.clone(), bound.into());
                filter.add_expr(expr.into());
            }
            filter.set_sort(descriptor.path.clone(), order);
        }
        SortOrder::None => {
            debug!(field, "no usable sort order, skipping sort");
        }
    }
    Ok(())
}

/// Equality or membership match expression for the document path.
pub(crate) fn doc_eq_or_in(path: &str, values: &[&str]) -> serde_json::Value {
    let mut inner = serde_json::Map::new();
    if values.len() == 1 {
        inner.insert("$eq".to_string(), values[0].into());
    } else {
        inner.insert(
            "$in".to_string(),
            serde_json::Value::Array(values.iter().map(|v| (*v).into()).collect()),
        );
    }
    let mut expr = serde_json::Map::new();
    expr.insert(path.to_string(), inner.into());
    expr.into()
}
