mod data;
pub mod db;
mod files;
pub mod models;
mod tables;

pub use db::{Database, DatabaseError, PurgeStats};
pub use tables::*;
