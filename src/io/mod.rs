pub mod config_io;
pub mod store_io;
pub mod workspace;
