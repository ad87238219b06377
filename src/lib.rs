//! Quiz engine behind the Sprouts family of children's learning games:
//! content packs, problem generators, persisted progress and parental
//! controls. The `sprouts` binary drives it in a terminal.

pub mod app;
pub mod config;
pub mod content;
pub mod event;
pub mod generator;
pub mod logging;
pub mod session;
pub mod store;
pub mod ui;
