//! Request handlers.

pub mod clips;
pub mod generate;
pub mod generations;
pub mod health;
pub mod providers;

pub use clips::*;
pub use generate::*;
pub use generations::*;
pub use health::*;
pub use providers::*;
