pub mod error;
pub mod options;
pub mod result;
pub mod engine;

pub use error::*;
pub use options::*;
pub use result::*;
pub use engine::*;
