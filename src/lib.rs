pub mod audit;
pub mod blob_store;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod sanitize;
pub mod services;
pub mod state;
