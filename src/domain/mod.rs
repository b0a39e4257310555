//! Application domain: data model, command vocabulary, input translation,
//! telemetry and persisted settings. Nothing here performs I/O except
//! [`settings::SettingsService`].

pub mod command;
pub mod dispatcher;
pub mod models;
pub mod settings;
pub mod telemetry;
