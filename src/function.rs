//! Live-range oracle
//!
//! The allocator never computes liveness itself. It asks an [`AllocFunction`]
//! for the live ranges, register classes and preferences of a function, and
//! hands spilled registers back to it for splitting. [`FunctionRanges`] is a
//! plain in-memory implementation for hosts that already have intervals.

use std::collections::BTreeMap;

use crate::live_range::LiveRange;
use crate::regs::{PReg, Reg, RegClassId, VReg};

/// Function adapter for register allocation.
pub trait AllocFunction {
    /// Every register that currently has a live range, ascending.
    fn registers(&self) -> Vec<Reg>;

    fn live_range(&self, reg: Reg) -> Option<&LiveRange>;

    fn reg_class(&self, vreg: VReg) -> Option<RegClassId>;

    /// Physical register a previous pass would like `vreg` to get.
    fn preference(&self, vreg: VReg) -> Option<PReg> {
        let _ = vreg;
        None
    }

    /// Move `vreg` to memory.
    ///
    /// The range of `vreg` is retired. Returns the replacement registers that
    /// still need a physical register (reloads around uses), empty when the
    /// value lives entirely in its stack slot.
    fn split_for_spill(&mut self, vreg: VReg) -> Vec<VReg>;
}

#[derive(Debug, Clone)]
struct VirtInfo {
    range: LiveRange,
    class: RegClassId,
    hint: Option<PReg>,
    use_points: Vec<u32>,
    spill_parent: Option<VReg>,
}

/// Precomputed live ranges of one function
#[derive(Debug, Clone, Default)]
pub struct FunctionRanges {
    name: String,
    vreg_count: u32,
    virt: BTreeMap<VReg, VirtInfo>,
    fixed: BTreeMap<PReg, LiveRange>,
    parents: BTreeMap<VReg, VReg>,
}

impl FunctionRanges {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocate a new virtual register with the given class and range
    pub fn add_vreg(&mut self, class: RegClassId, range: LiveRange) -> VReg {
        self.insert_vreg(VirtInfo {
            range,
            class,
            hint: None,
            use_points: Vec::new(),
            spill_parent: None,
        })
    }

    fn insert_vreg(&mut self, info: VirtInfo) -> VReg {
        let vreg = VReg(self.vreg_count);
        self.vreg_count += 1;
        self.virt.insert(vreg, info);
        vreg
    }

    pub fn set_preference(&mut self, vreg: VReg, preg: PReg) {
        if let Some(info) = self.virt.get_mut(&vreg) {
            info.hint = Some(preg);
        }
    }

    /// Program points where `vreg` is read or written.
    ///
    /// Points outside the register's range are ignored. A spilled register is
    /// reloaded at each of these points.
    pub fn set_use_points(&mut self, vreg: VReg, points: &[u32]) {
        if let Some(info) = self.virt.get_mut(&vreg) {
            let mut points: Vec<u32> = points
                .iter()
                .copied()
                .filter(|&p| info.range.contains(p))
                .collect();
            points.sort_unstable();
            points.dedup();
            info.use_points = points;
        }
    }

    /// Mark `range` as occupied by a physical register (ABI or reserved use)
    pub fn add_fixed_range(&mut self, preg: PReg, range: LiveRange) {
        self.fixed.entry(preg).or_default().merge(&range);
    }

    /// Register whose spill created `vreg`, if `vreg` is a reload range.
    /// Kept after `vreg` itself is spilled.
    pub fn spill_parent(&self, vreg: VReg) -> Option<VReg> {
        self.parents.get(&vreg).copied()
    }

    /// Virtual registers that still have a live range
    pub fn vregs(&self) -> impl Iterator<Item = VReg> + '_ {
        self.virt.keys().copied()
    }

    /// Number of virtual registers ever created, including retired ones
    pub fn vreg_count(&self) -> u32 {
        self.vreg_count
    }
}

impl AllocFunction for FunctionRanges {
    fn registers(&self) -> Vec<Reg> {
        self.virt
            .keys()
            .map(|&v| Reg::Virt(v))
            .chain(self.fixed.keys().map(|&p| Reg::Phys(p)))
            .collect()
    }

    fn live_range(&self, reg: Reg) -> Option<&LiveRange> {
        match reg {
            Reg::Virt(vreg) => self.virt.get(&vreg).map(|info| &info.range),
            Reg::Phys(preg) => self.fixed.get(&preg),
        }
    }

    fn reg_class(&self, vreg: VReg) -> Option<RegClassId> {
        self.virt.get(&vreg).map(|info| info.class)
    }

    fn preference(&self, vreg: VReg) -> Option<PReg> {
        self.virt.get(&vreg).and_then(|info| info.hint)
    }

    fn split_for_spill(&mut self, vreg: VReg) -> Vec<VReg> {
        let Some(info) = self.virt.remove(&vreg) else {
            return Vec::new();
        };
        // Reload ranges are already as narrow as they get.
        if info.spill_parent.is_some() {
            return Vec::new();
        }

        info.use_points
            .iter()
            .map(|&point| {
                let reload = self.insert_vreg(VirtInfo {
                    range: LiveRange::from_interval(point, point + 1),
                    class: info.class,
                    hint: None,
                    use_points: vec![point],
                    spill_parent: Some(vreg),
                });
                self.parents.insert(reload, vreg);
                reload
            })
            .collect()
    }
}
