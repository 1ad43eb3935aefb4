pub mod common;
pub mod community;
pub mod directory;
pub mod profiles;

pub use common::*;
pub use community::*;
pub use directory::*;
pub use profiles::*;
