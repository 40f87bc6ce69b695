//! Repository, feature catalog and query result types shared by the builder,
//! the store and the query engine. Field names match the persisted JSON exactly.

mod catalog;
mod category;
mod repository;
mod result;

pub use catalog::{AppInfo, Feature, SourceInfo};
pub use category::{FeatureCategory, ParseCategoryError};
pub(crate) use repository::{name_key, path_key};
pub use repository::{Flow, IntegrityError, Interaction, Repository, Screen, FLOW_PATH_SEPARATOR};
pub use result::{QueryResult, ScoreBreakdown, ScoredFlow};
