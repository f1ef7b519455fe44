//! cask-engine: caller-facing facade over the cask storage engine
//!
//! Assembles connection resolution, the browsing session, and the
//! confirmation policy for destructive operations. The presentation layer
//! talks to [`Session`]; everything below it is backend-independent.

pub mod resolver;
pub mod session;

pub use resolver::resolve;
pub use session::Session;
