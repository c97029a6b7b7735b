//! Discord command implementations organized by category.

/// General utility commands
pub mod general;
/// Registration commands
pub mod register;

// Export commands
pub use general::*;
pub use register::*;
