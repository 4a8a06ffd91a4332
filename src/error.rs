//! Allocation errors
//!
//! Running out of colors is not an error: it is resolved by spilling. Only
//! malformed input and a spill loop that stops making progress are reported.

use thiserror::Error;

use crate::regs::{Reg, RegClassId, VReg};

/// Errors that abort allocation of a function
#[derive(Debug, Error)]
pub enum AllocError {
    #[error("Unsatisfiable class constraint: {class} of {vreg} has an empty allocation order")]
    EmptyRegClass { vreg: VReg, class: RegClassId },

    #[error("Missing live range for {0}")]
    MissingLiveRange(Reg),

    #[error("Missing register class for {0}")]
    MissingRegClass(VReg),

    #[error("Unknown register class {class} for {vreg}")]
    UnknownRegClass { vreg: VReg, class: RegClassId },

    #[error("Spilling {0} produced no progress: split returned the spilled register")]
    SpillNoProgress(VReg),

    #[error("Allocation did not converge after {rounds} rounds")]
    NoConvergence { rounds: usize },

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),
}
