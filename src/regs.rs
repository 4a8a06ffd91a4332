//! Register, register class and stack slot identifiers

use std::fmt;
use std::num::NonZeroU32;

/// Virtual register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VReg(pub u32);

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Physical (hardware) register
///
/// Index 0 is never a register, so "no register" is spelled `Option<PReg>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PReg(NonZeroU32);

impl PReg {
    /// Returns `None` for index 0.
    pub fn new(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(Self)
    }

    /// Register at zero-based position `pos` of a register file
    pub(crate) fn from_position(pos: usize) -> Self {
        Self(NonZeroU32::MIN.saturating_add(pos as u32))
    }

    pub fn index(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for PReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Any register the live-range oracle can describe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Reg {
    Virt(VReg),
    Phys(PReg),
}

impl Reg {
    pub fn is_physical(self) -> bool {
        matches!(self, Reg::Phys(_))
    }

    pub fn as_virt(self) -> Option<VReg> {
        match self {
            Reg::Virt(vreg) => Some(vreg),
            Reg::Phys(_) => None,
        }
    }
}

impl From<VReg> for Reg {
    fn from(vreg: VReg) -> Self {
        Reg::Virt(vreg)
    }
}

impl From<PReg> for Reg {
    fn from(preg: PReg) -> Self {
        Reg::Phys(preg)
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reg::Virt(vreg) => vreg.fmt(f),
            Reg::Phys(preg) => preg.fmt(f),
        }
    }
}

/// Register class identifier, an index into a [`crate::RegisterFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegClassId(pub u32);

impl fmt::Display for RegClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rc{}", self.0)
    }
}

/// Stack slot identifier for spilled registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StackSlotId(pub u32);

impl fmt::Display for StackSlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ss{}", self.0)
    }
}
