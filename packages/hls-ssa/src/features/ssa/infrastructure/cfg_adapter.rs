//! Block graph adapter
//!
//! Projects the block arena of an `SsaModule` onto a petgraph `DiGraph` and
//! runs the structural post-condition checks over it: reachability from the
//! entry, predecessor/successor agreement, sealed blocks and phi shape.

use ahash::AHashMap as HashMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::features::ssa::domain::{BlockId, Operand, SsaModule, ValueKind};

use super::errors::{SSAError, SSAResult};

/// Control-flow view of an `SsaModule`
pub struct BlockGraph {
    graph: DiGraph<BlockId, ()>,
    nodes: HashMap<BlockId, NodeIndex>,
    entry: BlockId,
}

impl BlockGraph {
    /// One node per block, one edge per distinct branch target
    pub fn from_module(module: &SsaModule) -> Self {
        let mut graph = DiGraph::with_capacity(module.block_count(), module.block_count());
        let mut nodes = HashMap::with_capacity(module.block_count());

        for block in module.blocks() {
            nodes.insert(block.id, graph.add_node(block.id));
        }
        for block in module.blocks() {
            let from = nodes[&block.id];
            for succ in block.successors() {
                if let Some(&to) = nodes.get(&succ) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self {
            graph,
            nodes,
            entry: module.entry,
        }
    }

    pub fn block_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Blocks reachable from the entry, in DFS preorder
    pub fn reachable(&self) -> Vec<BlockId> {
        let Some(&start) = self.nodes.get(&self.entry) else {
            return Vec::new();
        };
        let mut dfs = Dfs::new(&self.graph, start);
        let mut out = Vec::new();
        while let Some(node) = dfs.next(&self.graph) {
            out.push(self.graph[node]);
        }
        out
    }

    /// Distinct blocks with an edge into `block`
    pub fn graph_predecessors(&self, block: BlockId) -> Vec<BlockId> {
        let Some(&node) = self.nodes.get(&block) else {
            return Vec::new();
        };
        let mut preds: Vec<BlockId> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        preds.sort();
        preds.dedup();
        preds
    }
}

/// Structural post-condition check over every reachable block
///
/// # Errors
///
/// Returns `SSAError::Invariant` naming the first offending block or value:
/// - a reachable block is unsealed
/// - a branch target does not list the source as predecessor, or a
///   predecessor has no edge into the block
/// - a phi's operands do not match the predecessor list one-to-one
/// - an instruction, phi or branch references a detached value
pub fn verify_module(module: &SsaModule) -> SSAResult<()> {
    let graph = BlockGraph::from_module(module);
    let reachable = graph.reachable();

    for &id in &reachable {
        let block = module.block(id)?;
        if !block.sealed {
            return Err(SSAError::invariant(format!("reachable block {} is not sealed", id)));
        }

        for succ in block.successors() {
            if !module.block(succ)?.has_predecessor(id) {
                return Err(SSAError::invariant(format!(
                    "{} branches to {} but is not one of its predecessors",
                    id, succ
                )));
            }
        }

        let mut listed = block.predecessors.clone();
        listed.sort();
        if listed != graph.graph_predecessors(id) {
            return Err(SSAError::invariant(format!(
                "predecessors of {} ({:?}) disagree with its incoming edges",
                id, block.predecessors
            )));
        }

        for &phi in &block.phis {
            let value = module.value(phi)?;
            if value.block != Some(id) {
                return Err(SSAError::invariant(format!("{} listed in {} but owned elsewhere", phi, id)));
            }
            let ValueKind::Phi(data) = &value.kind else {
                return Err(SSAError::invariant(format!("{} in the phi list of {} is not a phi", phi, id)));
            };
            let sources: Vec<BlockId> = data.operands.iter().map(|(_, b)| *b).collect();
            if sources != block.predecessors {
                return Err(SSAError::invariant(format!(
                    "phi {} in {} has sources {:?}, expected {:?}",
                    phi, id, sources, block.predecessors
                )));
            }
        }

        for &v in block.phis.iter().chain(block.instructions.iter()) {
            let value = module.value(v)?;
            if value.block != Some(id) {
                return Err(SSAError::invariant(format!("{} listed in {} but owned elsewhere", v, id)));
            }
            for op in value.operands() {
                check_attached(module, op, &format!("operand of {}", v))?;
            }
        }
        for branch in &block.branches {
            if let Some(cond) = branch.cond {
                check_attached(module, cond, &format!("branch condition in {}", id))?;
            }
        }
    }

    Ok(())
}

fn check_attached(module: &SsaModule, op: Operand, site: &str) -> SSAResult<()> {
    if let Operand::Value(v) = op {
        if !module.value(v)?.is_attached() {
            return Err(SSAError::invariant(format!("{} references detached value {}", site, v)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ssa::domain::BlockKind;

    #[test]
    fn test_reachable_excludes_orphans() {
        let mut module = SsaModule::new("m");
        let a = module.add_block("a", BlockKind::Live);
        let orphan = module.add_block("orphan", BlockKind::Live);
        module.add_target(module.entry, None, a).unwrap();
        module.add_target(orphan, None, a).unwrap();

        let graph = BlockGraph::from_module(&module);
        assert_eq!(graph.block_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.reachable(), vec![module.entry, a]);
    }

    #[test]
    fn test_unsealed_reachable_block_fails() {
        let mut module = SsaModule::new("m");
        let a = module.add_block("a", BlockKind::Live);
        module.add_target(module.entry, None, a).unwrap();
        module.block_mut(module.entry).unwrap().sealed = true;

        let err = verify_module(&module).unwrap_err();
        assert!(err.to_string().contains("bb1"));
    }

    #[test]
    fn test_sealed_chain_verifies() {
        let mut module = SsaModule::new("m");
        let a = module.add_block("a", BlockKind::Live);
        module.add_target(module.entry, None, a).unwrap();
        module.block_mut(module.entry).unwrap().sealed = true;
        module.block_mut(a).unwrap().sealed = true;

        assert!(verify_module(&module).is_ok());
    }
}
