pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{memory_view::MemoryView, view_sync::ViewSync};
pub use config::toml_config::BinderConfig;
pub use crate::core::{channel::EventChannel, session::BindingSession};
pub use domain::model::{ChangeEvent, Origin, SessionId};
pub use utils::error::{BinderError, Result};
