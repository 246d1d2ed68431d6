//! Local filesystem side of synchronisation.

pub mod store;

pub use store::LocalStore;
