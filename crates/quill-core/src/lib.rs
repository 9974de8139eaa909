pub mod config;
pub mod errors;
pub mod ids;
pub mod links;
pub mod message;
pub mod session;

pub use config::{AppConfig, AppearanceMode, ThemeLink};
pub use errors::{ApiError, DecodeError, ExtensionError};
pub use message::{Command, RawMessage};
pub use session::{Session, SessionIdentity, SessionKind};
