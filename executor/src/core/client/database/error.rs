use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Failed to serialize document: {0}")]
    FailedToSerializeDocument(String),

    #[error("Failed to convert value to bson: {0}")]
    BsonSerError(#[from] mongodb::bson::ser::Error),

    #[error("Item already exists: {0}")]
    ItemAlreadyExists(String),
}
