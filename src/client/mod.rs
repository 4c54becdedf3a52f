//! Client connection lifecycle

mod line_client;

pub use line_client::{Client, READ_BUF_SIZE};
