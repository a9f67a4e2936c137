//! Code editor panel that runs source on a remote lesson server and shows the
//! console output and variables it returns.

pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod execution;
pub mod html;
pub mod logging;
pub mod notebook;
pub mod output;
pub mod printer;
pub mod store;
pub mod tui;
pub mod utils;
pub mod view;
