pub use taskdeck_cli::cli;
pub use taskdeck_cli::commands;
pub use taskdeck_cli::config;
pub use taskdeck_cli::AppConfig;

pub use taskdeck_core as core;
pub use taskdeck_core::api;
pub use taskdeck_core::database as db;
pub use taskdeck_core::model;
pub use taskdeck_core::validation;

pub use taskdeck_client as client;
pub use taskdeck_client::{Session, SessionOptions};
