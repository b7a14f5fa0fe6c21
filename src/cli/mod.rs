pub mod app;
pub mod check;
pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod env;
pub mod output;
pub mod plan;
pub mod runtime;
