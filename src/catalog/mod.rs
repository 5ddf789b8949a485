mod error;
pub mod fetch;
mod store;
mod tle;

pub use error::{CatalogError, ValidationError};
pub use store::{load_records, save_records, Scope, TleRecord, TleStore};
pub use tle::{Origin, Satellite, TwoLineElement};
