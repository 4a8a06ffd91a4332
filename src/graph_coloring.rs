//! Graph Coloring Register Allocator
//!
//! Chaitin-style allocation with a minimum-degree elimination order and
//! whole-round retries after spilling.
//!
//! ## Algorithm Overview
//!
//! 1. **Build**: one node per virtual register, an edge for every pair of
//!    overlapping live ranges
//! 2. **Simplify**: repeatedly remove the node of minimum current degree
//!    (lowest id on ties) and push it on the select stack
//! 3. **Select**: pop the stack and give each node the first register of its
//!    class not held by a colored neighbor, not aliased by one, and not
//!    reserved by a fixed range
//! 4. **Spill**: a node with no such register goes to a stack slot and its
//!    range is split into reload ranges
//! 5. **Repeat**: any spill changes the live ranges, so the graph and the
//!    assignment are thrown away and a new round starts. A round with no
//!    spills is final.
//!
//! Simplify never compares degrees against the number of registers. Every
//! node is pushed in minimum-degree order and feasibility is decided only
//! during select.
//!
//! ## References
//!
//! - Chaitin, G. "Register Allocation & Spilling via Graph Coloring" (1982)
//! - Briggs, P. et al. "Improvements to Graph Coloring Register Allocation" (1994)

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, trace, warn};

use crate::config::AllocatorConfig;
use crate::error::AllocError;
use crate::function::AllocFunction;
use crate::regs::{PReg, Reg, StackSlotId, VReg};
use crate::target::RegisterFile;

#[path = "graph_coloring/build.rs"]
mod build;

#[path = "graph_coloring/simplify.rs"]
mod simplify;

#[path = "graph_coloring/select.rs"]
mod select;

#[path = "graph_coloring/spill.rs"]
mod spill;

#[path = "graph_coloring/verify.rs"]
mod verify;

pub use spill::{SpillOutcome, StackSlot};
pub use verify::verify_allocation;

use select::Selection;
use spill::SpillSlots;

/// VReg -> physical register assignment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment(BTreeMap<VReg, PReg>);

impl Assignment {
    pub fn get(&self, vreg: VReg) -> Option<PReg> {
        self.0.get(&vreg).copied()
    }

    pub fn contains(&self, vreg: VReg) -> bool {
        self.0.contains_key(&vreg)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VReg, PReg)> + '_ {
        self.0.iter().map(|(&v, &p)| (v, p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, vreg: VReg, preg: PReg) {
        self.0.insert(vreg, preg);
    }

    /// Render with register names, e.g. `[v0 -> eax] [v1 -> ebx]`
    pub fn display<'a>(&'a self, regs: &'a RegisterFile) -> AssignmentDisplay<'a> {
        AssignmentDisplay {
            assignment: self,
            regs,
        }
    }
}

pub struct AssignmentDisplay<'a> {
    assignment: &'a Assignment,
    regs: &'a RegisterFile,
}

impl fmt::Display for AssignmentDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (vreg, preg)) in self.assignment.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "[{} -> {}]", vreg, self.regs.name(preg))?;
        }
        Ok(())
    }
}

/// What happened in one build/simplify/select round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: usize,
    /// Virtual registers in the interference graph
    pub nodes: usize,
    pub edges: usize,
    pub colored: usize,
    pub spilled: usize,
    /// Replacement ranges created by this round's spills
    pub new_ranges: usize,
}

/// Result of graph coloring register allocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocationResult {
    /// Assignment of the final round
    pub assignment: Assignment,
    /// Every register spilled in any round and the slot it lives in
    pub spills: BTreeMap<VReg, StackSlotId>,
    pub spill_slots: Vec<StackSlot>,
    /// Reload ranges each open spill introduced. Reloads may have been
    /// spilled themselves in a later round.
    pub replacements: BTreeMap<VReg, Vec<VReg>>,
    pub rounds: Vec<RoundSummary>,
}

impl AllocationResult {
    pub fn slot_for(&self, vreg: VReg) -> Option<StackSlotId> {
        self.spills.get(&vreg).copied()
    }

    pub fn is_spilled(&self, vreg: VReg) -> bool {
        self.spills.contains_key(&vreg)
    }
}

/// Interference graph for one round
#[derive(Debug, Default)]
struct InterferenceGraph {
    /// Adjacency sets, iterated in ascending id order
    adj_list: BTreeMap<VReg, BTreeSet<VReg>>,
    /// Current degree: neighbors not yet on the select stack
    degree: BTreeMap<VReg, usize>,
    edge_count: usize,
}

impl InterferenceGraph {
    fn add_node(&mut self, vreg: VReg) {
        self.adj_list.entry(vreg).or_default();
        self.degree.entry(vreg).or_insert(0);
    }

    /// Add an interference edge. Returns false if it already existed.
    fn add_edge(&mut self, u: VReg, v: VReg) -> bool {
        if u == v {
            return false;
        }
        if !self.adj_list.entry(u).or_default().insert(v) {
            return false;
        }
        self.adj_list.entry(v).or_default().insert(u);
        *self.degree.entry(u).or_insert(0) += 1;
        *self.degree.entry(v).or_insert(0) += 1;
        self.edge_count += 1;
        true
    }

    #[cfg(test)]
    fn interferes(&self, u: VReg, v: VReg) -> bool {
        self.adj_list
            .get(&u)
            .map(|s| s.contains(&v))
            .unwrap_or(false)
    }

    fn degree(&self, vreg: VReg) -> usize {
        self.degree.get(&vreg).copied().unwrap_or(0)
    }

    fn adjacent(&self, vreg: VReg) -> impl Iterator<Item = VReg> + '_ {
        self.adj_list
            .get(&vreg)
            .into_iter()
            .flat_map(|s| s.iter().copied())
    }

    fn nodes(&self) -> impl Iterator<Item = VReg> + '_ {
        self.adj_list.keys().copied()
    }

    fn len(&self) -> usize {
        self.adj_list.len()
    }
}

/// Per-node state within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    /// In the graph, not yet removed
    Uncolored,
    /// Removed by simplify, waiting to be colored
    OnStack,
    Colored(PReg),
    Spilled,
}

/// Working state of one allocation round
///
/// Built fresh every round and dropped when the round ends.
#[derive(Debug, Default)]
struct RoundState {
    graph: InterferenceGraph,
    node_state: BTreeMap<VReg, NodeState>,
    /// Simplify order: last pushed is colored first
    select_stack: Vec<VReg>,
    assignment: Assignment,
}

impl RoundState {
    fn state(&self, vreg: VReg) -> NodeState {
        self.node_state
            .get(&vreg)
            .copied()
            .unwrap_or(NodeState::Uncolored)
    }

    fn is_on_stack(&self, vreg: VReg) -> bool {
        !matches!(self.state(vreg), NodeState::Uncolored)
    }

    /// Registers held by already-colored neighbors of `vreg`
    fn neighbor_colors(&self, vreg: VReg) -> BTreeSet<PReg> {
        self.graph
            .adjacent(vreg)
            .filter_map(|n| match self.state(n) {
                NodeState::Colored(preg) => Some(preg),
                _ => None,
            })
            .collect()
    }

    fn mark_colored(&mut self, vreg: VReg, preg: PReg) {
        self.node_state.insert(vreg, NodeState::Colored(preg));
        self.assignment.insert(vreg, preg);
    }

    fn mark_spilled(&mut self, vreg: VReg) {
        self.node_state.insert(vreg, NodeState::Spilled);
    }
}

/// The allocation driver
#[derive(Debug, Clone, Default)]
pub struct GraphColoringAllocator {
    config: AllocatorConfig,
}

impl GraphColoringAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AllocatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Allocate registers for one function, spilling and retrying until a
    /// round needs no spills
    pub fn allocate<F: AllocFunction>(
        &self,
        func: &mut F,
        regs: &RegisterFile,
    ) -> Result<AllocationResult, AllocError> {
        let mut slots = SpillSlots::new(self.config.reuse_spill_slots);
        let mut replacements: BTreeMap<VReg, Vec<VReg>> = BTreeMap::new();
        let mut rounds: Vec<RoundSummary> = Vec::new();

        // A function always gets at least one round.
        let max_rounds = self.config.max_rounds.max(1);

        loop {
            let round = rounds.len() + 1;
            if round > max_rounds {
                return Err(AllocError::NoConvergence { rounds: max_rounds });
            }
            if round == max_rounds {
                warn!("register allocation reached its last allowed round ({round})");
            }

            let mut state = RoundState::build(func, regs)?;
            debug!(
                "round {}: {} virtual registers, {} interference edges",
                round,
                state.graph.len(),
                state.graph.edge_count
            );

            state.simplify();
            let summary =
                self.select_round(&mut state, func, regs, &mut slots, &mut replacements, round)?;
            debug!(
                "round {}: {} colored, {} spilled, {} new ranges; {}",
                round,
                summary.colored,
                summary.spilled,
                summary.new_ranges,
                state.assignment.display(regs)
            );
            rounds.push(summary);

            if summary.spilled == 0 {
                let (spills, spill_slots) = slots.finish();
                let result = AllocationResult {
                    assignment: state.assignment,
                    spills,
                    spill_slots,
                    replacements,
                    rounds,
                };
                if self.config.verify {
                    verify_allocation(func, regs, &result)?;
                }
                return Ok(result);
            }
        }
    }

    /// Color every node in reverse simplify order
    fn select_round<F: AllocFunction>(
        &self,
        state: &mut RoundState,
        func: &mut F,
        regs: &RegisterFile,
        slots: &mut SpillSlots,
        replacements: &mut BTreeMap<VReg, Vec<VReg>>,
        round: usize,
    ) -> Result<RoundSummary, AllocError> {
        let mut summary = RoundSummary {
            round,
            nodes: state.graph.len(),
            edges: state.graph.edge_count,
            colored: 0,
            spilled: 0,
            new_ranges: 0,
        };

        let order = std::mem::take(&mut state.select_stack);
        for &vreg in order.iter().rev() {
            match self.color_node(state, func, regs, vreg)? {
                Selection::Color(preg) => {
                    trace!("{} -> {}", vreg, regs.name(preg));
                    state.mark_colored(vreg, preg);
                    summary.colored += 1;
                }
                Selection::Spill(reason) => {
                    state.mark_spilled(vreg);
                    let outcome = spill::spill_register(func, regs, slots, vreg)?;
                    trace!("{} spilled ({}): {:?}", vreg, reason, outcome);
                    summary.spilled += 1;
                    if let SpillOutcome::Open(new_ranges) = outcome {
                        summary.new_ranges += new_ranges.len();
                        replacements.insert(vreg, new_ranges);
                    }
                }
            }
        }
        state.select_stack = order;

        Ok(summary)
    }

    fn color_node<F: AllocFunction>(
        &self,
        state: &RoundState,
        func: &F,
        regs: &RegisterFile,
        vreg: VReg,
    ) -> Result<Selection, AllocError> {
        let range = func
            .live_range(Reg::Virt(vreg))
            .ok_or(AllocError::MissingLiveRange(Reg::Virt(vreg)))?;
        let class_id = func
            .reg_class(vreg)
            .ok_or(AllocError::MissingRegClass(vreg))?;
        let class = regs
            .class(class_id)
            .ok_or(AllocError::UnknownRegClass {
                vreg,
                class: class_id,
            })?;
        let taken = state.neighbor_colors(vreg);
        let hint = func.preference(vreg);

        let request = select::ColorRequest {
            range,
            class,
            hint,
            taken: &taken,
        };
        let selection = select::select_color(&request, func, regs);

        if self.config.hint_fallback && hint.is_some() {
            if let Selection::Spill(_) = selection {
                let request = select::ColorRequest { hint: None, ..request };
                return Ok(select::select_color(&request, func, regs));
            }
        }
        Ok(selection)
    }
}

/// Convenience function to allocate with the default configuration
pub fn allocate_registers<F: AllocFunction>(
    func: &mut F,
    regs: &RegisterFile,
) -> Result<AllocationResult, AllocError> {
    GraphColoringAllocator::new().allocate(func, regs)
}
