use super::*;

impl RoundState {
    /// Push every node on the select stack in minimum-degree order
    ///
    /// Removing a node only lowers the current degree of its neighbors; the
    /// adjacency sets stay intact for select.
    pub(super) fn simplify(&mut self) {
        while let Some(vreg) = self.min_degree_node() {
            trace!("push {} (degree {})", vreg, self.graph.degree(vreg));
            self.select_stack.push(vreg);
            self.node_state.insert(vreg, NodeState::OnStack);

            let neighbors: Vec<VReg> = self
                .graph
                .adjacent(vreg)
                .filter(|&n| !self.is_on_stack(n))
                .collect();
            for neighbor in neighbors {
                self.decrement_degree(neighbor);
            }
        }
    }

    /// Lowest-degree node still in the graph; ties go to the lowest id
    pub(super) fn min_degree_node(&self) -> Option<VReg> {
        self.graph
            .nodes()
            .filter(|&v| !self.is_on_stack(v))
            .min_by_key(|&v| self.graph.degree(v))
    }

    fn decrement_degree(&mut self, vreg: VReg) {
        if let Some(degree) = self.graph.degree.get_mut(&vreg) {
            *degree = degree.saturating_sub(1);
        }
    }
}
