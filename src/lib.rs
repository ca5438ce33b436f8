pub mod cli;
pub mod io;
pub mod logging;
pub mod mail;
pub mod model;
pub mod ops;
pub mod render;
pub mod util;
