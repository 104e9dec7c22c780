//! Llego document store
//!
//! Entity types, the `DocumentStore` seam with MongoDB and in-memory
//! backends, and typed repositories on top.

mod document;
mod entities;
mod memory;
#[cfg(feature = "mongo")]
mod mongo;
mod repository;

pub use document::{Document, DocumentStore, FieldValue, Filter};
pub use entities::{Branch, Business, Category, Coordinates, Product, Record, Subcategory, User};
pub use memory::MemoryStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;
pub use repository::Repository;
