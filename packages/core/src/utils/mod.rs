pub mod error;
pub mod ids;
pub mod logging;
pub mod time;
