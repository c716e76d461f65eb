//! Document-store aggregation pipeline generator.
//!
//! The document path does not render clause text; entity filters
//! produce match expressions and entity-specific stages, and this
//! module assembles them into a pipeline in fixed order:
//!
//! 1. `$match` built from the filter expressions,
//! 2. the entity's own stages (`$lookup`s, derived fields),
//! 3. `$sample` when no explicit sort was requested (or the request
//!    asked for random order),
//! 4. `$sort` when a non-random sort is present.
//!
//! The ordering is load-bearing: sampling substitutes for an explicit
//! sort, it never follows one.

use serde_json::{Value as JsonValue, json};
use tracing::debug;

use super::SortOrder;

/// Filter output for the document path: match expressions plus
/// aggregation stages, with the sort selection resolved by the filter.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub exprs: Vec<JsonValue>,
    pub stages: Vec<JsonValue>,
    pub sort_field: Option<String>,
    pub sort_order: SortOrder,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a match expression.
    pub fn add_expr(&mut self, expr: JsonValue) {
        self.exprs.push(expr);
    }

    /// Append an aggregation stage (lookup, derived field, ...).
    pub fn add_stage(&mut self, stage: JsonValue) {
        self.stages.push(stage);
    }

    /// Absorb a delegated filter's expressions and stages.
    pub fn combine(&mut self, other: DocumentFilter) {
        self.exprs.extend(other.exprs);
        self.stages.extend(other.stages);
    }

    /// Select an explicit field sort.
    pub fn set_sort(&mut self, field: impl Into<String>, order: SortOrder) {
        debug_assert!(order.is_explicit(), "set_sort takes ASC or DESC");
        self.sort_field = Some(field.into());
        self.sort_order = order;
    }

    /// Mark the filter for sample-based selection.
    pub fn set_random_order(&mut self) {
        self.sort_order = SortOrder::Random;
    }

    /// True when a non-random sort with a concrete field was selected.
    fn has_explicit_sort(&self) -> bool {
        self.sort_order.is_explicit() && self.sort_field.is_some()
    }
}

/// Assemble the aggregation pipeline. `sample_size` bounds the
/// `$sample` stage used when no explicit sort applies.
pub fn build_pipeline(filter: &DocumentFilter, sample_size: u32) -> Vec<JsonValue> {
    let mut stages = Vec::with_capacity(filter.stages.len() + 2);

    if !filter.exprs.is_empty() {
        stages.push(json!({ "$match": { "$and": filter.exprs } }));
    }

    stages.extend(filter.stages.iter().cloned());

    if filter.has_explicit_sort() {
        let field = filter.sort_field.as_deref().unwrap_or_default();
        let direction = if filter.sort_order == SortOrder::Ascending {
            1
        } else {
            -1
        };
        let mut sort_doc = serde_json::Map::new();
        sort_doc.insert(field.to_string(), json!(direction));
        stages.push(json!({ "$sort": sort_doc }));
    } else {
        stages.push(json!({ "$sample": { "size": sample_size } }));
    }

    debug!(stages = stages.len(), "assembled aggregation pipeline");
    stages
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_pipeline_orders_match_stages_sort() {
        let mut filter = DocumentFilter::new();
        filter.add_expr(json!({ "year": { "$eq": 1999 } }));
        filter.add_stage(json!({ "$lookup": {
            "from": "studios",
            "localField": "studio_id",
            "foreignField": "id",
            "as": "studio",
        }}));
        filter.set_sort("title", SortOrder::Ascending);

        let pipeline = build_pipeline(&filter, 25);
        assert_eq!(pipeline.len(), 3);
        assert!(pipeline[0].get("$match").is_some());
        assert!(pipeline[1].get("$lookup").is_some());
        assert_eq!(pipeline[2], json!({ "$sort": { "title": 1 } }));
    }

    #[test]
    fn test_sample_substitutes_for_missing_sort() {
        let filter = DocumentFilter::new();
        let pipeline = build_pipeline(&filter, 10);
        assert_eq!(pipeline, vec![json!({ "$sample": { "size": 10 } })]);
    }

    #[test]
    fn test_random_order_samples_even_with_stages() {
        let mut filter = DocumentFilter::new();
        filter.add_expr(json!({ "season": { "$eq": 2 } }));
        filter.set_random_order();

        let pipeline = build_pipeline(&filter, 5);
        let last = pipeline.last().unwrap();
        assert_eq!(last, &json!({ "$sample": { "size": 5 } }));
        assert!(pipeline.iter().all(|stage| stage.get("$sort").is_none()));
    }

    #[test]
    fn test_descending_sort_direction() {
        let mut filter = DocumentFilter::new();
        filter.set_sort("airing.first_date", SortOrder::Descending);
        let pipeline = build_pipeline(&filter, 25);
        assert_eq!(
            pipeline.last().unwrap(),
            &json!({ "$sort": { "airing.first_date": -1 } })
        );
    }
}
