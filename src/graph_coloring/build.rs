use super::*;

use crate::live_range::LiveRange;

impl RoundState {
    /// Build the interference graph for a round from the oracle's live ranges
    ///
    /// Physical registers constrain selection but are not nodes. Malformed
    /// input is rejected here, before anything is colored.
    pub(super) fn build<F: AllocFunction>(
        func: &F,
        regs: &RegisterFile,
    ) -> Result<Self, AllocError> {
        let mut state = RoundState::default();

        let mut ranges: Vec<(VReg, &LiveRange)> = Vec::new();
        for reg in func.registers() {
            let Some(vreg) = reg.as_virt() else {
                continue;
            };
            let range = func
                .live_range(reg)
                .ok_or(AllocError::MissingLiveRange(reg))?;
            check_class(func, regs, vreg)?;

            state.graph.add_node(vreg);
            state.node_state.insert(vreg, NodeState::Uncolored);
            ranges.push((vreg, range));
        }

        for i in 0..ranges.len() {
            let (u, u_range) = ranges[i];
            for &(v, v_range) in &ranges[i + 1..] {
                if u_range.overlaps(v_range) {
                    state.graph.add_edge(u, v);
                }
            }
        }

        Ok(state)
    }
}

/// A virtual register must name a known class with something to allocate
fn check_class<F: AllocFunction>(
    func: &F,
    regs: &RegisterFile,
    vreg: VReg,
) -> Result<(), AllocError> {
    let class = func
        .reg_class(vreg)
        .ok_or(AllocError::MissingRegClass(vreg))?;
    let rc = regs
        .class(class)
        .ok_or(AllocError::UnknownRegClass { vreg, class })?;
    if rc.allocation_order.is_empty() {
        return Err(AllocError::EmptyRegClass { vreg, class });
    }
    Ok(())
}
