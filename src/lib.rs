//! Galaxy carousel: a cached read path from the Directus store to a rendered page.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
