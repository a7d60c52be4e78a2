//! Persistence module split across logical submodules: connection handling and
//! schema creation, then the book/sale queries.

mod books;
mod connection;

pub use connection::Database;
