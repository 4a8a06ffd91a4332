use super::*;

use crate::live_range::LiveRange;

/// Check a finished allocation against the function's live ranges
///
/// Every live virtual register must be assigned a member of its class, no
/// two overlapping registers may get the same or aliasing registers, and no
/// assignment may collide with a fixed range.
pub fn verify_allocation<F: AllocFunction>(
    func: &F,
    regs: &RegisterFile,
    result: &AllocationResult,
) -> Result<(), AllocError> {
    let mut assigned: Vec<(VReg, PReg, &LiveRange)> = Vec::new();

    for reg in func.registers() {
        let Some(vreg) = reg.as_virt() else {
            continue;
        };
        let range = func
            .live_range(reg)
            .ok_or(AllocError::MissingLiveRange(reg))?;
        let Some(preg) = result.assignment.get(vreg) else {
            return Err(AllocError::InvalidAllocation(format!(
                "{vreg} is live but has no register"
            )));
        };

        let class_id = func
            .reg_class(vreg)
            .ok_or(AllocError::MissingRegClass(vreg))?;
        let class = regs.class(class_id).ok_or(AllocError::UnknownRegClass {
            vreg,
            class: class_id,
        })?;
        if !class.contains(preg) {
            return Err(AllocError::InvalidAllocation(format!(
                "{} assigned {} outside class {}",
                vreg,
                regs.name(preg),
                class.name
            )));
        }

        for r in std::iter::once(preg).chain(regs.aliases(preg)) {
            if let Some(fixed) = func.live_range(Reg::Phys(r)) {
                if fixed.overlaps(range) {
                    return Err(AllocError::InvalidAllocation(format!(
                        "{} assigned {} which is reserved by a fixed range of {}",
                        vreg,
                        regs.name(preg),
                        regs.name(r)
                    )));
                }
            }
        }

        assigned.push((vreg, preg, range));
    }

    for (i, &(u, u_reg, u_range)) in assigned.iter().enumerate() {
        for &(v, v_reg, v_range) in &assigned[i + 1..] {
            if regs.overlap(u_reg, v_reg) && u_range.overlaps(v_range) {
                return Err(AllocError::InvalidAllocation(format!(
                    "{} ({}) and {} ({}) overlap",
                    u,
                    regs.name(u_reg),
                    v,
                    regs.name(v_reg)
                )));
            }
        }
    }

    Ok(())
}
