pub mod connection;

pub use connection::{ConnectionState, Database};
