pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod models;
pub mod progress;
pub mod routes;
pub mod seed;
