//! Database model and its assembly from the catalog

mod builder;
mod database_model;
mod elements;
mod rows;

pub use builder::{build_model, DatabaseModelFactory, ScaffoldOptions};
pub use database_model::DatabaseModel;
pub use elements::*;
