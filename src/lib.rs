pub mod types;
pub mod turbine;
pub mod site;
pub mod layout;
pub mod wake;
pub mod simulation;

pub use types::*;
