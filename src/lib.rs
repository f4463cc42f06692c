#[macro_use]
extern crate diesel;
#[macro_use]
extern crate log;

pub mod accounts;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entries;
pub mod error;
pub mod leaderboard;
pub mod models;
pub mod predictions;
pub mod results;
pub mod schema;
pub mod scores;
pub mod scoring;
pub mod web;

pub use error::Error;
