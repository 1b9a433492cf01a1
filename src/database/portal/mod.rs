mod file_repository;
mod model;

pub use file_repository::*;
pub use model::*;
