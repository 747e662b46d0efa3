pub mod anchors;
pub mod error;
pub mod format;
pub mod plain_text;
pub mod result;
pub mod visitor;

pub use anchors::*;
pub use error::*;
pub use format::*;
pub use plain_text::*;
pub use result::*;
pub use visitor::*;
