//! Entity metadata tables.
//!
//! One [EntityMeta] static per catalog entity, holding the query-space
//! type name, the aliases used by the two generators, and the field
//! table the sortable resolver walks. The tables are hand-written: they
//! are the single source of truth for which fields exist, which are
//! sortable, and how sort names/paths deviate from field names.

use once_cell::sync::OnceCell;

use crate::sortable::{SortableDescriptor, ValueKind};

/// One declared field of an entity.
#[derive(Debug)]
pub struct FieldSpec {
    /// Field name; also the default sort name and path segment.
    pub name: &'static str,
    /// Declared value kind; decides the string conversion for casting.
    pub kind: ValueKind,
    /// Whether the field is a selectable sort target. Non-sortable
    /// fields still contribute path segments for sortable descendants.
    pub sortable: bool,
    /// Explicit sort name; replaces the leaf segment of the default path.
    pub sort_name: Option<&'static str>,
    /// Explicit absolute sort path; wins outright over the accumulated path.
    pub sort_path: Option<&'static str>,
    /// Embedded entity to recurse into (bounded depth).
    pub nested: Option<&'static EntityMeta>,
}

impl FieldSpec {
    pub const fn plain(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            sortable: false,
            sort_name: None,
            sort_path: None,
            nested: None,
        }
    }

    pub const fn sortable(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            kind,
            sortable: true,
            sort_name: None,
            sort_path: None,
            nested: None,
        }
    }

    pub const fn renamed(name: &'static str, kind: ValueKind, sort_name: &'static str) -> Self {
        Self {
            name,
            kind,
            sortable: true,
            sort_name: Some(sort_name),
            sort_path: None,
            nested: None,
        }
    }

    pub const fn at_path(name: &'static str, kind: ValueKind, sort_path: &'static str) -> Self {
        Self {
            name,
            kind,
            sortable: true,
            sort_name: None,
            sort_path: Some(sort_path),
            nested: None,
        }
    }

    pub const fn embedded(name: &'static str, nested: &'static EntityMeta) -> Self {
        Self {
            name,
            kind: ValueKind::Json,
            sortable: false,
            sort_name: None,
            sort_path: None,
            nested: Some(nested),
        }
    }
}

/// Static metadata for one entity type.
#[derive(Debug)]
pub struct EntityMeta {
    /// Query-space type name (relational FROM target).
    pub name: &'static str,
    /// Alias used in rendered relational statements.
    pub alias: &'static str,
    /// Document-store collection name.
    pub collection: &'static str,
    /// Declared fields, in declaration order.
    pub fields: &'static [FieldSpec],
    /// Resolved sortable descriptors, built once on first use.
    pub(crate) sortable: OnceCell<Vec<SortableDescriptor>>,
}

impl EntityMeta {
    pub const fn new(
        name: &'static str,
        alias: &'static str,
        collection: &'static str,
        fields: &'static [FieldSpec],
    ) -> Self {
        Self {
            name,
            alias,
            collection,
            fields,
            sortable: OnceCell::new(),
        }
    }
}

impl PartialEq for EntityMeta {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

pub static LOCATION: EntityMeta = EntityMeta::new(
    "Location",
    "location",
    "locations",
    &[
        FieldSpec::sortable("city", ValueKind::Text),
        FieldSpec::sortable("country", ValueKind::Text),
    ],
);

pub static STUDIO: EntityMeta = EntityMeta::new(
    "Studio",
    "studio",
    "studios",
    &[
        FieldSpec::plain("id", ValueKind::Text),
        FieldSpec::sortable("name", ValueKind::Text),
        FieldSpec::sortable("founded", ValueKind::Int),
        FieldSpec::embedded("headquarters", &LOCATION),
    ],
);

pub static GENRE: EntityMeta = EntityMeta::new(
    "Genre",
    "genre",
    "genres",
    &[
        FieldSpec::plain("id", ValueKind::Text),
        FieldSpec::sortable("name", ValueKind::Text),
    ],
);

pub static SERIES: EntityMeta = EntityMeta::new(
    "Series",
    "series",
    "series",
    &[
        FieldSpec::plain("id", ValueKind::Text),
        FieldSpec::sortable("title", ValueKind::Text),
        FieldSpec::sortable("year", ValueKind::Int),
        // Clients sort on "score"; the stored field stays "rating".
        FieldSpec::renamed("rating", ValueKind::Float, "score"),
        FieldSpec::plain("status", ValueKind::Text),
        FieldSpec::sortable("added_at", ValueKind::Date),
        // Opaque provider-id blob; sortable upstream but has no converter.
        FieldSpec::sortable("external_ids", ValueKind::Json),
        FieldSpec::embedded("studio", &STUDIO),
        FieldSpec::embedded("genres", &GENRE),
    ],
);

pub static EPISODE: EntityMeta = EntityMeta::new(
    "Episode",
    "episode",
    "episodes",
    &[
        FieldSpec::plain("id", ValueKind::Text),
        FieldSpec::sortable("season", ValueKind::Int),
        FieldSpec::sortable("number", ValueKind::Int),
        FieldSpec::sortable("title", ValueKind::Text),
        // Air dates moved into the `airing` sub-document; the sort path
        // is pinned so old clients keep working.
        FieldSpec::at_path("air_date", ValueKind::Date, "airing.first_date"),
        FieldSpec::embedded("series", &SERIES),
    ],
);
