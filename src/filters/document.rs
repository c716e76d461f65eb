//! Document-path entity filters.
//!
//! The document deployment stores the `series` and `episodes`
//! collections. Filters emit match expressions for the leading
//! `$match` stage and entity-scoped `$lookup`/derived-field stages;
//! joined-field predicates go into a `$match` stage placed after the
//! lookup that produces the joined array.

use serde_json::json;

use crate::entities::{EPISODE, SERIES};
use crate::error::QueryError;
use crate::params::{RequestParams, parse_float_param, parse_numeric_param};
use crate::statement::pipeline::DocumentFilter;

use super::{DocumentEntityFilter, SeriesFilter, apply_document_sort, doc_eq_or_in, has_any};

pub struct SeriesDocumentFilter;

impl DocumentEntityFilter for SeriesDocumentFilter {
    fn collection(&self) -> &'static str {
        SERIES.collection
    }

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
    ) -> Result<DocumentFilter, QueryError> {
        let mut filter = DocumentFilter::new();

        if is_root {
            let ids = params.non_empty_values("id");
            if !ids.is_empty() {
                filter.add_expr(doc_eq_or_in("id", &ids));
            }
        }

        if let Some(title) = params.first("title") {
            filter.add_expr(json!({ "title": { "$regex": title, "$options": "i" } }));
        }

        if let Some(raw) = params.first("year") {
            if let Some(year) = parse_numeric_param("year", raw) {
                filter.add_expr(json!({ "year": { "$eq": year } }));
            }
        }

        if let Some(raw) = params.first("min_rating") {
            if let Some(min) = parse_float_param("min_rating", raw) {
                filter.add_expr(json!({ "rating": { "$gte": min } }));
            }
        }
        if let Some(raw) = params.first("max_rating") {
            if let Some(max) = parse_float_param("max_rating", raw) {
                filter.add_expr(json!({ "rating": { "$lte": max } }));
            }
        }

        let statuses = params.non_empty_values("status");
        if !statuses.is_empty() {
            filter.add_expr(doc_eq_or_in("status", &statuses));
        }

        // Studio predicates need the lookup first; the match on the
        // joined array follows it as its own stage.
        if let Some(studio) = params.first("studio") {
            filter.add_stage(json!({ "$lookup": {
                "from": "studios",
                "localField": "studio_id",
                "foreignField": "id",
                "as": "studio",
            }}));
            filter.add_stage(json!({ "$match": { "studio.name": { "$eq": studio } } }));
        }

        if let Some(genre) = params.first("genre") {
            filter.add_expr(json!({ "genres": { "$elemMatch": { "name": genre } } }));
        }

        if is_root {
            apply_document_sort(&mut filter, params, &SERIES)?;
        }
        Ok(filter)
    }
}

pub struct EpisodeDocumentFilter;

impl DocumentEntityFilter for EpisodeDocumentFilter {
    fn collection(&self) -> &'static str {
        EPISODE.collection
    }

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
    ) -> Result<DocumentFilter, QueryError> {
        let mut filter = DocumentFilter::new();

        if is_root {
            if let Some(id) = params.first("id") {
                filter.add_expr(json!({ "id": { "$eq": id } }));
            }
        }

        if let Some(raw) = params.first("season") {
            if let Some(season) = parse_numeric_param("season", raw) {
                filter.add_expr(json!({ "season": { "$eq": season } }));
            }
        }

        if let Some(raw) = params.first("episode") {
            if let Some(number) = parse_numeric_param("episode", raw) {
                filter.add_expr(json!({ "number": { "$eq": number } }));
            }
        }

        // Derived flag consumed by the handlers; computed in the store
        // so it reflects store time, not service time.
        filter.add_stage(json!({ "$addFields": {
            "has_aired": { "$lt": ["$airing.first_date", "$$NOW"] },
        }}));

        if has_any(params, SeriesFilter::KEYS) {
            filter.add_stage(json!({ "$lookup": {
                "from": "series",
                "localField": "series_id",
                "foreignField": "id",
                "as": "series",
            }}));
            if let Some(title) = params.first("title") {
                filter.add_stage(json!({ "$match": {
                    "series.title": { "$regex": title, "$options": "i" },
                }}));
            }
            if let Some(raw) = params.first("year") {
                if let Some(year) = parse_numeric_param("year", raw) {
                    filter.add_stage(json!({ "$match": { "series.year": { "$eq": year } } }));
                }
            }
        }

        if is_root {
            apply_document_sort(&mut filter, params, &EPISODE)?;
        }
        Ok(filter)
    }
}
