pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod mailto;
pub mod schedule;
pub mod web;
