//! Series filter.

use rand::RngCore;

use crate::entities::{EntityMeta, GENRE, SERIES, STUDIO};
use crate::error::QueryError;
use crate::params::{RequestParams, parse_float_param, parse_numeric_param};
use crate::statement::{ParamValue, Statement};

use super::{EntityFilter, GenreFilter, StudioFilter, apply_sort, has_any};

/// Parameters recognized on the series resource.
pub struct SeriesFilter;

impl SeriesFilter {
    /// Keys that make a parent filter join to series and delegate here.
    pub(crate) const KEYS: &'static [&'static str] = &[
        "title",
        "year",
        "min_rating",
        "max_rating",
        "status",
        "studio",
        "genre",
        "country",
    ];
}

impl EntityFilter for SeriesFilter {
    fn entity(&self) -> &'static EntityMeta {
        &SERIES
    }

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, QueryError> {
        let mut stmt = Statement::new(&SERIES, rng);

        // Raw id predicates are root-only: off-root they would collide
        // with the parent's column references.
        if is_root {
            let ids = params.non_empty_values("id");
            match ids.as_slice() {
                [] => {}
                [id] => stmt.add_clause(
                    "series.id = ?",
                    vec![ParamValue::Text((*id).to_string())],
                ),
                many => stmt.add_clause(
                    "series.id IN ?",
                    vec![ParamValue::List(
                        many.iter().map(|id| ParamValue::Text((*id).to_string())).collect(),
                    )],
                ),
            }
        }

        if let Some(title) = params.first("title") {
            stmt.add_clause(
                "LOWER(series.title) LIKE ?",
                vec![ParamValue::Text(format!("%{}%", title.to_lowercase()))],
            );
        }

        if let Some(raw) = params.first("year") {
            if let Some(year) = parse_numeric_param("year", raw) {
                stmt.add_clause("series.year = ?", vec![ParamValue::Int(year)]);
            }
        }

        if let Some(raw) = params.first("min_rating") {
            if let Some(min) = parse_float_param("min_rating", raw) {
                stmt.add_clause("series.rating >= ?", vec![ParamValue::Float(min)]);
            }
        }
        if let Some(raw) = params.first("max_rating") {
            if let Some(max) = parse_float_param("max_rating", raw) {
                stmt.add_clause("series.rating <= ?", vec![ParamValue::Float(max)]);
            }
        }

        let statuses = params.non_empty_values("status");
        match statuses.as_slice() {
            [] => {}
            [status] => stmt.add_clause(
                "series.status = ?",
                vec![ParamValue::Text((*status).to_string())],
            ),
            many => stmt.add_clause(
                "series.status IN ?",
                vec![ParamValue::List(
                    many.iter().map(|s| ParamValue::Text((*s).to_string())).collect(),
                )],
            ),
        }

        // Joined sub-resources: declare the join, then absorb the child
        // filter's own predicates.
        if has_any(params, StudioFilter::KEYS) {
            stmt.add_join(&SERIES, &STUDIO, "studio_id", Some("id"));
            stmt.combine(StudioFilter.build_filters(params, false, rng)?);
        }
        if has_any(params, GenreFilter::KEYS) {
            stmt.add_join(&SERIES, &GENRE, "genres", None);
            stmt.combine(GenreFilter.build_filters(params, false, rng)?);
        }

        if is_root {
            apply_sort(&mut stmt, params)?;
        }
        Ok(stmt)
    }
}
