//! Development server module.
//!
//! Provides the live-reload dev server:
//! - Static file serving with the reload client injected into pages
//! - Change notifications pushed over Server-Sent Events
//! - First free port at or after the requested one

pub mod addr;
pub mod bus;
pub mod config;
pub mod files;
pub mod live_dir;
pub mod server;
pub mod sniff;
pub mod virtual_file;

// Re-exports
pub use addr::{parse_listen, ListenAddr};
pub use bus::{EventBus, Message, Subscription, SubscriptionId};
pub use config::DevConfig;
pub use live_dir::{LiveReloadDir, ServedEntry, LIVE_PATH, RELOAD_SCRIPT};
pub use server::{build_router, find_next_port, open_browser, DevServer, PORT_SCAN_SPAN};
pub use sniff::{classify, ContentKind};
pub use virtual_file::VirtualFile;
