//! Application services: the carousel read path and its persistence seams.

pub mod carousel;
pub mod error;
pub mod repos;
