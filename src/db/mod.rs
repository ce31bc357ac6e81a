// src/db/mod.rs

pub mod connection;
pub mod migrations;

pub use connection::{
    create_connection_pool, create_connection_pool_at, create_test_connection, create_test_pool,
    get_connection, ConnectionPool, PooledConn,
};
pub use migrations::{get_database_stats, initialize_database, verify_database_integrity};
