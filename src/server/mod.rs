pub mod builder;
pub mod handler;

pub use builder::StatusServer;
pub use handler::StatusHandler;
