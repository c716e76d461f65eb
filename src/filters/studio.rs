//! Studio filter.

use rand::RngCore;

use crate::entities::{EntityMeta, STUDIO};
use crate::error::QueryError;
use crate::params::{RequestParams, parse_numeric_param};
use crate::statement::{ParamValue, Statement};

use super::{EntityFilter, apply_sort};

pub struct StudioFilter;

impl StudioFilter {
    pub(crate) const KEYS: &'static [&'static str] = &["studio", "country", "founded"];
}

impl EntityFilter for StudioFilter {
    fn entity(&self) -> &'static EntityMeta {
        &STUDIO
    }

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, QueryError> {
        let mut stmt = Statement::new(&STUDIO, rng);

        if is_root {
            if let Some(id) = params.first("id") {
                stmt.add_clause("studio.id = ?", vec![ParamValue::Text(id.to_string())]);
            }
        }

        if let Some(name) = params.first("studio") {
            stmt.add_clause("studio.name = ?", vec![ParamValue::Text(name.to_string())]);
        }

        if let Some(country) = params.first("country") {
            stmt.add_clause(
                "studio.headquarters.country = ?",
                vec![ParamValue::Text(country.to_string())],
            );
        }

        if let Some(raw) = params.first("founded") {
            if let Some(year) = parse_numeric_param("founded", raw) {
                stmt.add_clause("studio.founded = ?", vec![ParamValue::Int(year)]);
            }
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

    #[test]
    fn test_root_filter_reads_all_keys() {
        let params = RequestParams::from_pairs([
            ("id", "s1"),
            ("studio", "Mosfilm"),
            ("country", "USSR"),
            ("founded", "1924"),
        ]);
        let mut rng = SmallRng::seed_from_u64(3);
        let stmt = StudioFilter.build_filters(&params, true, &mut rng).unwrap();
        let texts: Vec<&str> = stmt.clauses().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "studio.id = ?",
                "studio.name = ?",
                "studio.headquarters.country = ?",
                "studio.founded = ?",
            ]
        );
    }

    #[test]
    fn test_non_root_skips_id() {
        let params = RequestParams::from_pairs([("id", "s1"), ("studio", "Mosfilm")]);
        let mut rng = SmallRng::seed_from_u64(3);
        let stmt = StudioFilter.build_filters(&params, false, &mut rng).unwrap();
        assert_eq!(stmt.clauses().len(), 1);
        assert_eq!(stmt.clauses()[0].text, "studio.name = ?");
    }
}
