//! Register file description
//!
//! Physical registers, the register classes that constrain which of them a
//! virtual register may use, and the alias relation between physical
//! registers (sub/super-registers that share storage).

use std::collections::{BTreeMap, BTreeSet};

use crate::regs::{PReg, RegClassId};

/// Default spill slot size and alignment in bytes
pub const DEFAULT_SPILL_SIZE: u32 = 8;

/// A set of physical registers legal for some kind of value
#[derive(Debug, Clone)]
pub struct RegClass {
    pub name: String,
    /// Every register legal for the class
    pub members: BTreeSet<PReg>,
    /// Registers handed out by the allocator, in preference order
    pub allocation_order: Vec<PReg>,
    /// Bytes needed to spill a value of this class
    pub spill_size: u32,
    pub spill_align: u32,
}

impl RegClass {
    pub fn contains(&self, preg: PReg) -> bool {
        self.members.contains(&preg)
    }
}

/// Physical registers, classes and aliases of a target
#[derive(Debug, Clone, Default)]
pub struct RegisterFile {
    names: Vec<String>,
    classes: Vec<RegClass>,
    aliases: BTreeMap<PReg, BTreeSet<PReg>>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a physical register. Indices start at 1.
    pub fn add_register(&mut self, name: impl Into<String>) -> PReg {
        let preg = PReg::from_position(self.names.len());
        self.names.push(name.into());
        preg
    }

    /// Add a class whose allocation order is its member list
    pub fn add_class(&mut self, name: impl Into<String>, members: &[PReg]) -> RegClassId {
        let id = RegClassId(self.classes.len() as u32);
        self.classes.push(RegClass {
            name: name.into(),
            members: members.iter().copied().collect(),
            allocation_order: members.to_vec(),
            spill_size: DEFAULT_SPILL_SIZE,
            spill_align: DEFAULT_SPILL_SIZE,
        });
        id
    }

    /// Restrict the registers handed out for a class
    ///
    /// Registers outside the class are dropped from the order.
    pub fn set_allocation_order(&mut self, class: RegClassId, order: &[PReg]) {
        if let Some(rc) = self.classes.get_mut(class.0 as usize) {
            rc.allocation_order = order
                .iter()
                .copied()
                .filter(|r| rc.members.contains(r))
                .collect();
        }
    }

    pub fn set_spill_size(&mut self, class: RegClassId, size: u32, align: u32) {
        if let Some(rc) = self.classes.get_mut(class.0 as usize) {
            rc.spill_size = size;
            rc.spill_align = align.max(1);
        }
    }

    /// Declare that `a` and `b` share storage. The relation is symmetric.
    pub fn add_alias(&mut self, a: PReg, b: PReg) {
        if a == b {
            return;
        }
        self.aliases.entry(a).or_default().insert(b);
        self.aliases.entry(b).or_default().insert(a);
    }

    pub fn class(&self, id: RegClassId) -> Option<&RegClass> {
        self.classes.get(id.0 as usize)
    }

    pub fn classes(&self) -> impl Iterator<Item = (RegClassId, &RegClass)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, rc)| (RegClassId(i as u32), rc))
    }

    /// Allocation order of a class, empty for unknown classes
    pub fn allocation_order(&self, id: RegClassId) -> &[PReg] {
        self.class(id)
            .map(|rc| rc.allocation_order.as_slice())
            .unwrap_or(&[])
    }

    /// Registers aliasing `preg`, not including `preg` itself
    pub fn aliases(&self, preg: PReg) -> impl Iterator<Item = PReg> + '_ {
        self.aliases
            .get(&preg)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    /// True when `a` and `b` are the same register or alias each other
    pub fn overlap(&self, a: PReg, b: PReg) -> bool {
        a == b
            || self
                .aliases
                .get(&a)
                .map(|s| s.contains(&b))
                .unwrap_or(false)
    }

    pub fn name(&self, preg: PReg) -> &str {
        self.names
            .get(preg.index() as usize - 1)
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn num_registers(&self) -> usize {
        self.names.len()
    }
}
