//! Genre filter.

use rand::RngCore;

use crate::entities::{EntityMeta, GENRE};
use crate::error::QueryError;
use crate::params::RequestParams;
use crate::statement::{ParamValue, Statement};

use super::{EntityFilter, apply_sort};

pub struct GenreFilter;

impl GenreFilter {
    pub(crate) const KEYS: &'static [&'static str] = &["genre"];
}

impl EntityFilter for GenreFilter {
    fn entity(&self) -> &'static EntityMeta {
        &GENRE
    }

    fn build_filters(
        &self,
        params: &RequestParams,
        is_root: bool,
        rng: &mut dyn RngCore,
    ) -> Result<Statement, QueryError> {
        let mut stmt = Statement::new(&GENRE, rng);

        if is_root {
            if let Some(id) = params.first("id") {
                stmt.add_clause("genre.id = ?", vec![ParamValue::Text(id.to_string())]);
            }
        }

        let names = params.non_empty_values("genre");
        match names.as_slice() {
            [] => {}
            [name] => stmt.add_clause(
                "genre.name = ?",
                vec![ParamValue::Text((*name).to_string())],
            ),
            many => stmt.add_clause(
                "genre.name IN ?",
                vec![ParamValue::List(
                    many.iter().map(|n| ParamValue::Text((*n).to_string())).collect(),
                )],
            ),
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
    fn test_multiple_genres_become_membership() {
        let params = RequestParams::from_pairs([("genre", "drama"), ("genre", "sci-fi")]);
        let mut rng = SmallRng::seed_from_u64(5);
        let stmt = GenreFilter.build_filters(&params, false, &mut rng).unwrap();
        assert_eq!(stmt.clauses()[0].text, "genre.name IN ?");
        assert_eq!(
            stmt.clauses()[0].params,
            vec![ParamValue::List(vec![
                ParamValue::Text("drama".into()),
                ParamValue::Text("sci-fi".into()),
            ])]
        );
    }
}
