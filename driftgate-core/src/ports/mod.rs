pub mod vector_store;
pub mod warehouse;
