pub mod auth;
pub mod client;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extract;
pub mod middlewares;
pub mod model;
pub mod payload;
pub mod response;
pub mod routes;
pub mod startup;
pub mod state;
pub mod telemetry;
