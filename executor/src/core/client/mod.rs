pub mod database;
pub mod queue;

pub use database::mongodb::MongoDbClient;
