pub mod logs;
pub mod tokens;
pub mod users;
pub mod watches;
