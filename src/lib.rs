pub mod app_config;
pub mod constants;
pub mod content;
pub mod db;
pub mod filesystem;
pub mod flash;
pub mod middleware;
pub mod orm;
pub mod session;
pub mod video;
pub mod web;
