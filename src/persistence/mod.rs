//! # Persistence Module
//!
//! Owns everything that outlives a process: the TOML configuration file and
//! the button mapping edited through it.
//!
//! ```text
//! config.toml ──► AppConfig ──► KeyMap ──► MappingStore ──[watch]──► session task
//!      ▲                                        ▲
//!      └──────── config_reload (mtime poll) ────┘
//! ```
//!
//! ## Error Handling Strategy
//! File and parse failures carry `color_eyre` context with the offending
//! path. Mapping validation errors are `MappingError`s so callers can tell a
//! typo in a button name from an unreadable file.
//!
//! A missing file is created with defaults; a broken file stops startup but
//! never replaces a mapping that is already running.

pub mod app_config;
pub mod config_reload;
pub mod mapping_store;

pub use app_config::{AppConfig, DeviceConfig, MappingEntry, CONFIG_ENV};
pub use config_reload::start_reload_task;
pub use mapping_store::MappingStore;
