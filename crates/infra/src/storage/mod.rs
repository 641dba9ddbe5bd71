//! Durable key-value storage backends

mod file_store;

pub use file_store::FileStore;
