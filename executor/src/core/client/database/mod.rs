pub mod constant;
pub mod error;
pub mod mongodb;

pub use error::DatabaseError;
