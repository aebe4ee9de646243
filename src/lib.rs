pub mod auth;
pub mod collectors;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod routes;
pub mod store;
