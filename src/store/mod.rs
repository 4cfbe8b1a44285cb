pub mod history;
pub mod record_id;
pub mod sqlite;
pub mod traits;
pub mod vector;

pub use history::ChatHistory;
pub use record_id::RecordId;
pub use sqlite::SqliteDocumentStore;
pub use traits::{
    DocumentStore, Filter, Namespace, Similarity, VectorHit, VectorIndexDefinition,
};
