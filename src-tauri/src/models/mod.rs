pub mod enums;
pub mod outcome;
pub mod permission;
pub mod step;

pub use enums::*;
pub use outcome::*;
pub use permission::*;
pub use step::*;
