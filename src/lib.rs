pub mod cli;
pub mod commands;
pub mod config;
pub mod drag;
pub mod form;
pub mod logging;
pub mod model;
pub mod projector;
pub mod seed;
pub mod storage;
pub mod store;
pub mod ui;
