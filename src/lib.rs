//! Data-access core for the Curator catalog service.
//!
//! Translates request-derived filter/sort/pagination intent into query
//! representations for two structurally different stores — a relational
//! store (joins, positional parameters, a generated statement string)
//! and a document store (match expressions plus aggregation pipeline
//! stages) — and memoizes expensive results behind a stampede-safe
//! cache facade.
//!
//! The flow per request: the entity's filter interprets the parameter
//! multimap into a [statement::Statement] (or a document
//! [statement::pipeline::DocumentFilter]), a generator renders the
//! store-specific query, and [cache::CachingFacade] deduplicates
//! execution against the derived cache key. Execution itself happens
//! behind the narrow [store] traits.

pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod filters;
pub mod logging;
pub mod params;
pub mod sortable;
pub mod statement;
pub mod store;

pub use cache::{CacheSettings, CachingFacade, derive_key, should_bypass_cache};
pub use config::Config;
pub use error::QueryError;
pub use filters::{
    DocumentEntityFilter, EntityFilter, EpisodeFilter, GenreFilter, SeriesFilter, StudioFilter,
};
pub use params::RequestParams;
pub use sortable::{SortableDescriptor, ValueKind, find_by_name, resolve_sortable};
pub use statement::{ParamValue, SelectQuery, SortOrder, Statement, render_count, render_select};
pub use store::{DocumentStore, Page, RelationalStore};
