//! Relational query generator.
//!
//! Renders a [Statement] into the entity-query dialect the relational
//! store executes: `SELECT <alias> FROM <Type> <alias>`, association or
//! keyed `LEFT JOIN`s, `AND`-joined predicates, and either a field sort
//! or the store's random-ordering function. Rendering is pure: the same
//! statement renders to byte-identical output and is never mutated.

use serde::Serialize;
use tracing::debug;

use super::{ParamValue, SortOrder, Statement};

/// A rendered query: statement text plus ordered positional values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectQuery {
    pub text: String,
    pub params: Vec<ParamValue>,
}

/// Render the select form of the statement.
pub fn render_select(stmt: &Statement) -> SelectQuery {
    let alias = stmt.entity().alias;
    let mut text = format!("SELECT {alias} FROM {} {alias}", stmt.entity().name);
    render_joins(&mut text, stmt);
    let params = render_where(&mut text, stmt);
    render_order(&mut text, stmt);

    debug!(query = %text, params = params.len(), "rendered select");
    SelectQuery { text, params }
}

/// Render the count form: same joins and predicates, no ordering.
pub fn render_count(stmt: &Statement) -> SelectQuery {
    let alias = stmt.entity().alias;
    let mut text = format!("SELECT COUNT({alias}) FROM {} {alias}", stmt.entity().name);
    render_joins(&mut text, stmt);
    let params = render_where(&mut text, stmt);

    debug!(query = %text, params = params.len(), "rendered count");
    SelectQuery { text, params }
}

fn render_joins(text: &mut String, stmt: &Statement) {
    for join in stmt.joins() {
        match join.foreign_field {
            // Association join: follow the declared path.
            None => {
                text.push_str(&format!(
                    " LEFT JOIN {}.{} AS {}",
                    join.local.alias, join.local_field, join.foreign.alias
                ));
            }
            // Keyed join: explicit foreign column against a local one.
            Some(foreign_field) => {
                text.push_str(&format!(
                    " LEFT JOIN {} {} ON {}.{} = {}.{}",
                    join.foreign.name,
                    join.foreign.alias,
                    join.foreign.alias,
                    foreign_field,
                    join.local.alias,
                    join.local_field
                ));
            }
        }
    }
}

/// Emit the WHERE section, rewriting bare `?` placeholders into 1-based
/// ordinals left to right across all clauses, and collect the bound
/// values in the same order.
fn render_where(text: &mut String, stmt: &Statement) -> Vec<ParamValue> {
    let mut params = Vec::new();
    if stmt.clauses().is_empty() {
        return params;
    }

    let mut counter = 0usize;
    let mut fragments = Vec::with_capacity(stmt.clauses().len());
    for clause in stmt.clauses() {
        let mut fragment = clause.text.clone();
        for _ in 0..clause.params.len() {
            counter += 1;
            fragment = number_next_placeholder(fragment, counter);
        }
        fragments.push(fragment);
        params.extend(clause.params.iter().cloned());
    }

    text.push_str(" WHERE ");
    text.push_str(&fragments.join(" AND "));
    params
}

/// Replace the first bare `?` (one not already ordinal-numbered) with
/// `?{ordinal}`.
fn number_next_placeholder(fragment: String, ordinal: usize) -> String {
    let bytes = fragment.as_bytes();
    for (pos, byte) in bytes.iter().enumerate() {
        if *byte != b'?' {
            continue;
        }
        if bytes.get(pos + 1).is_some_and(|next| next.is_ascii_digit()) {
            continue;
        }
        return format!("{}?{}{}", &fragment[..pos], ordinal, &fragment[pos + 1..]);
    }
    fragment
}

fn render_order(text: &mut String, stmt: &Statement) {
    match stmt.sort_order() {
        SortOrder::Random => {
            // No field sort for random order; results are not reproducible.
            text.push_str(&format!(" ORDER BY FUNCTION('RAND', {})", stmt.seed()));
        }
        SortOrder::Ascending | SortOrder::Descending => {
            if let Some(field) = stmt.sort_field() {
                let direction = if stmt.sort_order() == SortOrder::Ascending {
                    "asc"
                } else {
                    "desc"
                };
                text.push_str(&format!(
                    " ORDER BY {} {}",
                    stmt.qualify_path(field),
                    direction
                ));
            }
        }
        SortOrder::None => {}
    }
}
