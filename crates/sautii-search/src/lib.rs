pub mod assemble;
pub mod engine;
pub mod facets;
pub mod paginate;

pub use assemble::SearchResult;
pub use engine::SearchEngine;
pub use facets::Facets;

#[cfg(test)]
pub(crate) mod testing;
