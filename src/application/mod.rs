//! Application services layer.

pub mod error;
pub mod render;
pub mod replies;
pub mod repos;
pub mod syndication;
