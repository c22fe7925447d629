//! Built-in weight strategies.
//!
//! - [`FixedWeight`]: constant exposure, the pure passive control arm
//! - [`MomentumTilt`]: tiered exposure driven by trailing momentum

mod dca;
mod momentum;

pub use dca::FixedWeight;
pub use momentum::{MomentumTilt, MomentumWeights};
