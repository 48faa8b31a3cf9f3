pub mod catalog;
pub mod config;
pub mod error;
pub mod library;
pub mod loader;
pub mod protocol;
pub mod sequence;
pub mod server;
pub mod similarity;
pub mod sort;
pub mod transport;
pub mod tree;
pub mod types;

pub use catalog::{build_index, Catalog};
pub use error::LibrarianError;
pub use library::Library;
pub use sequence::GenreOrder;
pub use tree::{CatalogIndex, NodeValue};
pub use types::{BookId, BookRecord, LengthBucket, SortCriterion};
