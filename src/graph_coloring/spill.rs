use super::*;

use crate::live_range::LiveRange;
use crate::regs::RegClassId;
use crate::target::RegClass;

/// Stack storage for spilled registers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSlot {
    pub id: StackSlotId,
    pub class: RegClassId,
    pub size: u32,
    pub align: u32,
    /// Union of the ranges of every register spilled here
    pub range: LiveRange,
}

/// Whether a spill left anything to allocate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpillOutcome {
    /// The value lives in its slot for its whole range
    Closed,
    /// Replacement ranges that still need registers
    Open(Vec<VReg>),
}

/// Stack slot table for one function
///
/// Slots are shared between spilled registers of the same class whose
/// ranges never overlap. A reload range holds its parent's value, so when it
/// is spilled it goes back to the parent's slot.
#[derive(Debug)]
pub(super) struct SpillSlots {
    reuse: bool,
    slots: Vec<StackSlot>,
    slot_for: BTreeMap<VReg, StackSlotId>,
    /// Reload range -> the register first spilled to memory
    roots: BTreeMap<VReg, VReg>,
}

impl SpillSlots {
    pub(super) fn new(reuse: bool) -> Self {
        Self {
            reuse,
            slots: Vec::new(),
            slot_for: BTreeMap::new(),
            roots: BTreeMap::new(),
        }
    }

    /// Remember that `reloads` were split off the spilled `parent`
    pub(super) fn record_reloads(&mut self, parent: VReg, reloads: &[VReg]) {
        let root = self.root_of(parent);
        for &reload in reloads {
            self.roots.insert(reload, root);
        }
    }

    fn root_of(&self, vreg: VReg) -> VReg {
        self.roots.get(&vreg).copied().unwrap_or(vreg)
    }

    pub(super) fn slot_for(&self, vreg: VReg) -> Option<StackSlotId> {
        self.slot_for.get(&vreg).copied()
    }

    /// Get or create the slot for `vreg` and record `range` in it
    pub(super) fn assign(
        &mut self,
        vreg: VReg,
        class_id: RegClassId,
        class: &RegClass,
        range: &LiveRange,
    ) -> StackSlotId {
        let root = self.root_of(vreg);
        if root != vreg {
            if let Some(id) = self.slot_for(root) {
                // The value is already in memory; the reload range adds nothing.
                self.slot_for.insert(vreg, id);
                return id;
            }
        }

        let idx = match self.slot_for(vreg) {
            Some(id) => id.0 as usize,
            None => {
                let reusable = if self.reuse {
                    self.slots
                        .iter()
                        .position(|s| s.class == class_id && !s.range.overlaps(range))
                } else {
                    None
                };
                reusable.unwrap_or_else(|| {
                    self.slots.push(StackSlot {
                        id: StackSlotId(self.slots.len() as u32),
                        class: class_id,
                        size: class.spill_size,
                        align: class.spill_align,
                        range: LiveRange::new(),
                    });
                    self.slots.len() - 1
                })
            }
        };

        let slot = &mut self.slots[idx];
        slot.range.merge(range);
        self.slot_for.insert(vreg, slot.id);
        slot.id
    }

    pub(super) fn finish(self) -> (BTreeMap<VReg, StackSlotId>, Vec<StackSlot>) {
        (self.slot_for, self.slots)
    }
}

/// Send `vreg` to a stack slot and let the oracle split its range
pub(super) fn spill_register<F: AllocFunction>(
    func: &mut F,
    regs: &RegisterFile,
    slots: &mut SpillSlots,
    vreg: VReg,
) -> Result<SpillOutcome, AllocError> {
    let range = func
        .live_range(Reg::Virt(vreg))
        .cloned()
        .ok_or(AllocError::MissingLiveRange(Reg::Virt(vreg)))?;
    let class_id = func
        .reg_class(vreg)
        .ok_or(AllocError::MissingRegClass(vreg))?;
    let class = regs.class(class_id).ok_or(AllocError::UnknownRegClass {
        vreg,
        class: class_id,
    })?;

    let slot = slots.assign(vreg, class_id, class, &range);
    debug!(
        "spilling {} {} ({} points) to {}",
        vreg,
        range,
        range.len(),
        slot
    );

    let new_ranges = func.split_for_spill(vreg);
    if new_ranges.contains(&vreg) {
        return Err(AllocError::SpillNoProgress(vreg));
    }

    if new_ranges.is_empty() {
        Ok(SpillOutcome::Closed)
    } else {
        slots.record_reloads(vreg, &new_ranges);
        Ok(SpillOutcome::Open(new_ranges))
    }
}
