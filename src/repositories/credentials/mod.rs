pub mod credential_store;
pub mod memory_store;
pub mod mongo_store;

pub use credential_store::*;
pub use memory_store::MemoryCredentialStore;
pub use mongo_store::MongoCredentialStore;
