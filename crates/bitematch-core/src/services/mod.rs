//! Application services shared by every client

pub mod database;

pub use database::DatabaseService;
