//! Category domain - registry snapshots, ranking and the category source

mod ranker;
mod registry;
mod source;

pub use ranker::top_n;
pub use registry::{CategoryEntry, CategoryRegistry, RegistrySnapshot};
pub use source::{CategoryRecord, CategorySource};

#[cfg(test)]
pub use source::MockCategorySource;
