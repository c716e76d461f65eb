//! Sortable-field resolution and value casting.
//!
//! Walks an entity's field table (bounded depth) to build the list of
//! descriptors eligible as sort targets, and parses client-supplied
//! strings (sort cursors) into typed values for those descriptors.

use std::fmt;

use time::macros::format_description;

use crate::entities::EntityMeta;
use crate::error::QueryError;
use crate::statement::ParamValue;

/// How deep the resolver recurses into embedded entities (root = 0).
const MAX_DEPTH: usize = 2;

/// Declared value kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Int,
    Float,
    Bool,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Structured blob; no string conversion is registered for it.
    Json,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Int => "integer",
            ValueKind::Float => "float",
            ValueKind::Bool => "boolean",
            ValueKind::Date => "date",
            ValueKind::Json => "json",
        };
        f.write_str(name)
    }
}

/// A field eligible for ordering: its external name, its storage path,
/// its kind, and (via [cast_value](Self::cast_value)) how to parse a
/// string into that kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SortableDescriptor {
    pub name: String,
    pub path: String,
    pub kind: ValueKind,
}

impl SortableDescriptor {
    /// Parse `raw` into this descriptor's kind.
    ///
    /// Kinds with no registered conversion produce
    /// [QueryError::NoConverter] here, never a silently wrong value.
    pub fn cast_value(&self, raw: &str) -> Result<ParamValue, QueryError> {
        let invalid = || QueryError::InvalidValue {
            value: raw.to_string(),
            kind: self.kind,
        };
        match self.kind {
            ValueKind::Text => Ok(ParamValue::Text(raw.to_string())),
            ValueKind::Int => raw
                .parse::<i64>()
                .map(ParamValue::Int)
                .map_err(|_| invalid()),
            ValueKind::Float => raw
                .parse::<f64>()
                .map(ParamValue::Float)
                .map_err(|_| invalid()),
            ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(ParamValue::Bool(true)),
                "false" | "0" => Ok(ParamValue::Bool(false)),
                _ => Err(invalid()),
            },
            ValueKind::Date => {
                let format = format_description!("[year]-[month]-[day]");
                time::Date::parse(raw, &format)
                    .map(ParamValue::Date)
                    .map_err(|_| invalid())
            }
            ValueKind::Json => Err(QueryError::NoConverter { kind: self.kind }),
        }
    }
}

/// Resolve the sortable descriptors for an entity type.
///
/// Built once per type and cached on the metadata. Fields marked
/// sortable become descriptors; embedded fields are entered to depth
/// [MAX_DEPTH] regardless of their own sortability, so nested
/// containers still expose sortable descendants with concatenated
/// paths.
pub fn resolve_sortable(meta: &'static EntityMeta) -> &'static [SortableDescriptor] {
    meta.sortable.get_or_init(|| {
        let mut descriptors = Vec::new();
        walk(meta, "", 0, &mut descriptors);
        descriptors
    })
}

fn walk(meta: &'static EntityMeta, prefix: &str, depth: usize, out: &mut Vec<SortableDescriptor>) {
    for field in meta.fields {
        if field.sortable {
            let leaf = field.sort_name.unwrap_or(field.name);
            let path = match field.sort_path {
                Some(explicit) => explicit.to_string(),
                None => join_path(prefix, leaf),
            };
            out.push(SortableDescriptor {
                name: leaf.to_string(),
                path,
                kind: field.kind,
            });
        }
        if let Some(nested) = field.nested {
            if depth < MAX_DEPTH {
                let child_prefix = join_path(prefix, field.name);
                walk(nested, &child_prefix, depth + 1, out);
            }
        }
    }
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}.{segment}")
    }
}

/// Exact, case-sensitive lookup by descriptor `name` (not `path`).
pub fn find_by_name<'a>(
    descriptors: &'a [SortableDescriptor],
    name: &str,
) -> Option<&'a SortableDescriptor> {
    descriptors.iter().find(|d| d.name == name)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use time::macros::date;

    use super::*;
    use crate::entities::{EPISODE, SERIES, STUDIO};

    fn paths(descriptors: &[SortableDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn test_resolves_own_fields_with_overrides() {
        let descriptors = resolve_sortable(&SERIES);

        // Default name/path.
        let title = find_by_name(descriptors, "title").unwrap();
        assert_eq!(title.path, "title");
        assert_eq!(title.kind, ValueKind::Text);

        // Explicit name replaces the leaf segment of the path too.
        let score = find_by_name(descriptors, "score").unwrap();
        assert_eq!(score.path, "score");
        assert_eq!(score.kind, ValueKind::Float);
        assert!(find_by_name(descriptors, "rating").is_none());

        // Unmarked fields are not sort targets.
        assert!(find_by_name(descriptors, "id").is_none());
        assert!(find_by_name(descriptors, "status").is_none());
    }

    #[test]
    fn test_explicit_path_wins_outright() {
        let descriptors = resolve_sortable(&EPISODE);
        let air_date = find_by_name(descriptors, "air_date").unwrap();
        assert_eq!(air_date.path, "airing.first_date");
    }

    #[test]
    fn test_nested_containers_expose_descendants() {
        let descriptors = resolve_sortable(&SERIES);
        let all = paths(descriptors);

        // Depth 1 and 2 through non-sortable containers.
        assert!(all.contains(&"studio.name"));
        assert!(all.contains(&"studio.founded"));
        assert!(all.contains(&"studio.headquarters.city"));
        assert!(all.contains(&"genres.name"));
    }

    #[test]
    fn test_depth_bound_cuts_at_two_levels() {
        let descriptors = resolve_sortable(&EPISODE);
        let all = paths(descriptors);

        // series (1) -> studio (2) is included...
        assert!(all.contains(&"series.studio.name"));
        // ...but studio's own embedded location would be depth 3.
        assert!(!all.iter().any(|p| p.starts_with("series.studio.headquarters")));
    }

    #[test]
    fn test_no_conflicting_descriptor_types() {
        for meta in [&SERIES, &EPISODE, &STUDIO] {
            let descriptors = resolve_sortable(meta);
            for a in descriptors {
                for b in descriptors {
                    if a.name == b.name && a.path == b.path {
                        assert_eq!(a.kind, b.kind, "{}/{} resolved twice", a.name, a.path);
                    }
                }
            }
        }
    }

    #[test]
    fn test_find_by_name_is_case_sensitive() {
        let descriptors = resolve_sortable(&SERIES);
        assert!(find_by_name(descriptors, "title").is_some());
        assert!(find_by_name(descriptors, "Title").is_none());
    }

    #[test]
    fn test_cast_value_per_kind() {
        let descriptors = resolve_sortable(&SERIES);

        let year = find_by_name(descriptors, "year").unwrap();
        assert_eq!(year.cast_value("1999").unwrap(), ParamValue::Int(1999));
        assert_matches!(
            year.cast_value("next year"),
            Err(QueryError::InvalidValue { .. })
        );

        let added = find_by_name(descriptors, "added_at").unwrap();
        assert_eq!(
            added.cast_value("2024-05-17").unwrap(),
            ParamValue::Date(date!(2024 - 05 - 17))
        );
    }

    #[test]
    fn test_cast_without_converter_is_an_explicit_failure() {
        let descriptors = resolve_sortable(&SERIES);
        let external = find_by_name(descriptors, "external_ids").unwrap();
        assert_matches!(
            external.cast_value("{}"),
            Err(QueryError::NoConverter {
                kind: ValueKind::Json
            })
        );
    }
}
