//! Vocabulary review scheduling: a pure spaced-review scheduler, a SQLite progress store,
//! snapshot study sessions and the HTTP surface that ties them together.

pub mod api;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod feedback;
pub mod models;
pub mod session;
pub mod srs;
