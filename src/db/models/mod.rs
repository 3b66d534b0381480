pub mod log_entry;
pub mod token;
pub mod user;
pub mod watch;

pub use log_entry::{LogEntry, LogTable, NewLogEntry};
pub use token::Token;
pub use user::User;
pub use watch::{Watch, WatchInfo};
