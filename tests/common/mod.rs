// Common test utilities

pub mod harness;
pub mod stubs;

pub use harness::*;
pub use stubs::*;
