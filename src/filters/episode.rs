//! Episode filter.

use rand::RngCore;
use time::macros::format_description;
use tracing::debug;

use crate::entities::{EPISODE, EntityMeta, SERIES};
use crate::error::QueryError;
use crate::params::{RequestParams, parse_numeric_param};
use crate::statement::{ParamValue, Statement};

use super::{EntityFilter, SeriesFilter, apply_sort, has_any};

pub struct EpisodeFilter;

impl EntityFilter for EpisodeFilter {
    fn entity(&self) -> &'static EntityMeta {
        &EPISODE
    }

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, QueryError> {
        let mut stmt = Statement::new(&EPISODE, rng);

        if is_root {
            if let Some(id) = params.first("id") {
                stmt.add_clause("episode.id = ?", vec![ParamValue::Text(id.to_string())]);
            }
        }

        if let Some(raw) = params.first("season") {
            if let Some(season) = parse_numeric_param("season", raw) {
                stmt.add_clause("episode.season = ?", vec![ParamValue::Int(season)]);
            }
        }

        if let Some(raw) = params.first("episode") {
            if let Some(number) = parse_numeric_param("episode", raw) {
                stmt.add_clause("episode.number = ?", vec![ParamValue::Int(number)]);
            }
        }

        if let Some(raw) = params.first("aired_after") {
            let format = format_description!("[year]-[month]-[day]");
            match time::Date::parse(raw, &format) {
                Ok(date) => stmt.add_clause(
                    "episode.airing.first_date >= ?",
                    vec![ParamValue::Date(date)],
                ),
                Err(_) => debug!(value = %raw, "ignoring unparseable aired_after"),
            }
        }

        // Any series-level parameter pulls in the series join and its
        // filter.
        if has_any(params, SeriesFilter::KEYS) {
            stmt.add_join(&EPISODE, &SERIES, "series", None);
            stmt.combine(SeriesFilter.build_filters(params, false, rng)?);
        }

        if is_root {
            apply_sort(&mut stmt, params)?;
        }
        Ok(stmt)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::statement::{SortOrder, render_select};

    fn build(pairs: &[(&str, &str)]) -> Statement {
        let params = RequestParams::from_pairs(pairs.iter().copied());
        let mut rng = SmallRng::seed_from_u64(11);
        EpisodeFilter
            .build_filters(&params, true, &mut rng)
            .expect("filter build")
    }

    #[test]
    fn test_series_params_pull_in_join_and_child_clauses() {
        let stmt = build(&[("season", "2"), ("title", "october"), ("studio", "Mosfilm")]);

        assert!(stmt.joins().iter().any(|j| j.foreign.name == "Series"));
        // The series filter itself joined studio; combine carried it up.
        assert!(stmt.joins().iter().any(|j| j.foreign.name == "Studio"));
        assert!(stmt.clauses().iter().any(|c| c.text == "episode.season = ?"));
        assert!(
            stmt.clauses()
                .iter()
                .any(|c| c.text == "LOWER(series.title) LIKE ?")
        );
    }

    #[test]
    fn test_pinned_sort_path_used_for_cursor() {
        let stmt = build(&[("sort", "air_date asc"), ("last_seen", "2020-01-01")]);
        assert!(
            stmt.clauses()
                .iter()
                .any(|c| c.text == "episode.airing.first_date >= ?")
        );
        assert_eq!(stmt.sort_field(), Some("airing.first_date"));
        assert_eq!(stmt.sort_order(), SortOrder::Ascending);
    }

    #[test]
    fn test_render_association_join() {
        let stmt = build(&[("title", "october")]);
        let query = render_select(&stmt);
        assert!(query.text.contains("LEFT JOIN episode.series AS series"));
    }
}
