//! SQLite backend for the Tamagotchi engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
