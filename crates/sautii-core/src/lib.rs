pub mod errors;
pub mod filter;
pub mod geo;
pub mod model;
pub mod predicate;
pub mod text;

pub use errors::*;
pub use filter::*;
pub use model::*;
pub use predicate::*;
