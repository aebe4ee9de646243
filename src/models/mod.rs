pub mod job;
pub mod offer;
pub mod user;
