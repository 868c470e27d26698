//! Like-based recommendations for film, music and book catalogs.
//!
//! The core lives in [`services`]: Jaccard similarity between like-sets,
//! neighbor selection, weighted aggregation and the genre and random
//! fallbacks. [`db`] supplies dataset snapshots and [`api`] exposes the
//! whole thing over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
