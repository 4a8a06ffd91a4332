//! Graph coloring register allocator
//!
//! Maps the virtual registers of one function onto a fixed set of physical
//! registers, spilling to stack slots when the interference graph can't be
//! colored. Liveness is supplied by the host through [`AllocFunction`];
//! register classes and aliases through a [`RegisterFile`].
//!
//! ```no_run
//! use graph_regalloc::{FunctionRanges, LiveRange, RegisterFile, allocate_registers};
//!
//! let mut regs = RegisterFile::new();
//! let r0 = regs.add_register("r0");
//! let r1 = regs.add_register("r1");
//! let gpr = regs.add_class("gpr", &[r0, r1]);
//!
//! let mut func = FunctionRanges::new("main");
//! let a = func.add_vreg(gpr, LiveRange::from_interval(0, 10));
//! let b = func.add_vreg(gpr, LiveRange::from_interval(5, 15));
//!
//! let result = allocate_registers(&mut func, &regs)?;
//! assert_ne!(result.assignment.get(a), result.assignment.get(b));
//! # Ok::<(), graph_regalloc::AllocError>(())
//! ```

pub mod config;
pub mod error;
pub mod function;
pub mod graph_coloring;
pub mod live_range;
pub mod regs;
pub mod target;

pub use config::AllocatorConfig;
pub use error::AllocError;
pub use function::{AllocFunction, FunctionRanges};
pub use graph_coloring::{
    AllocationResult, Assignment, GraphColoringAllocator, RoundSummary, SpillOutcome, StackSlot,
    allocate_registers, verify_allocation,
};
pub use live_range::{LiveRange, Segment};
pub use regs::{PReg, Reg, RegClassId, StackSlotId, VReg};
pub use target::{RegClass, RegisterFile};
