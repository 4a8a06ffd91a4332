use super::*;

use crate::live_range::LiveRange;
use crate::target::RegClass;

/// Everything needed to pick a register for one node
#[derive(Debug, Clone, Copy)]
pub(super) struct ColorRequest<'a> {
    pub range: &'a LiveRange,
    pub class: &'a RegClass,
    /// Preferred register; replaces the allocation order when present
    pub hint: Option<PReg>,
    /// Registers held by colored neighbors
    pub taken: &'a BTreeSet<PReg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Selection {
    Color(PReg),
    Spill(SpillReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SpillReason {
    /// Colored neighbors hold every candidate
    NeighborsExhausted,
    /// Candidates remained but each was aliased, reserved or out of class
    Constrained,
}

impl fmt::Display for SpillReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpillReason::NeighborsExhausted => write!(f, "no free register"),
            SpillReason::Constrained => write!(f, "no compatible register"),
        }
    }
}

/// Pick the first usable register for a node
pub(super) fn select_color<F: AllocFunction>(
    req: &ColorRequest<'_>,
    func: &F,
    regs: &RegisterFile,
) -> Selection {
    let potential = potential_regs(req);
    if potential.is_empty() {
        return Selection::Spill(SpillReason::NeighborsExhausted);
    }

    potential
        .into_iter()
        .find(|&preg| {
            !alias_taken(preg, req.taken, regs)
                && !fixed_conflict(preg, req.range, func, regs)
                && req.class.contains(preg)
        })
        .map(Selection::Color)
        .unwrap_or(Selection::Spill(SpillReason::Constrained))
}

/// Candidates in scan order, minus registers held by colored neighbors
fn potential_regs(req: &ColorRequest<'_>) -> Vec<PReg> {
    let mut potential = match req.hint {
        Some(preg) => vec![preg],
        None => req.class.allocation_order.clone(),
    };
    potential.retain(|preg| !req.taken.contains(preg));
    potential
}

/// Some alias of `preg` is held by a colored neighbor
fn alias_taken(preg: PReg, taken: &BTreeSet<PReg>, regs: &RegisterFile) -> bool {
    regs.aliases(preg).any(|alias| taken.contains(&alias))
}

/// `preg` or one of its aliases is occupied by a fixed range overlapping `range`
fn fixed_conflict<F: AllocFunction>(
    preg: PReg,
    range: &LiveRange,
    func: &F,
    regs: &RegisterFile,
) -> bool {
    std::iter::once(preg)
        .chain(regs.aliases(preg))
        .filter_map(|r| func.live_range(Reg::Phys(r)))
        .any(|fixed| fixed.overlaps(range))
}
