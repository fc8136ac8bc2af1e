pub mod auctions;
pub mod connection;
pub mod logs;

pub use connection::Database;
