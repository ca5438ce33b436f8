pub mod agenda;
pub mod blob;
pub mod config;
pub mod items;

pub use agenda::*;
pub use blob::*;
pub use config::*;
pub use items::*;
