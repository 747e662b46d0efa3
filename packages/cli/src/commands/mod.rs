pub mod convert;
pub mod init;
pub mod stats;

pub use convert::{convert, ConvertArgs};
pub use init::{init, InitArgs};
pub use stats::{stats, StatsArgs};
