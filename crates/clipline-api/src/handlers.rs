//! Request handlers.

pub mod artifacts;
pub mod health;
pub mod publish;
pub mod upload;
pub mod videos;

pub use artifacts::*;
pub use health::*;
pub use publish::*;
pub use upload::*;
pub use videos::*;
