pub mod channel;
pub mod dependency;
pub mod session;
pub mod store;
pub mod template;

pub use crate::domain::model::{ChangeEvent, ChannelEvent, EventKind, Origin, Property, SessionId};
pub use crate::domain::ports::{ElementId, ElementQuery, Headless, PropertyLinker, ViewTree};
pub use crate::utils::error::Result;
