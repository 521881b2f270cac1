//! Runtime: injected I/O traits and the per-user command router

mod router;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use router::CommandRouter;
pub use traits::*;
