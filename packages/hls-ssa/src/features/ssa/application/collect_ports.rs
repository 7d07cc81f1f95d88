use std::collections::BTreeSet;

use crate::features::ssa::domain::{IoDirection, SsaModule};
use crate::features::ssa::infrastructure::SSAResult;
use crate::features::ssa::ports::SsaModuleConsumer;
use crate::shared::models::PortId;

/// Ports touched by IO instructions in reachable blocks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortUsage {
    pub read: BTreeSet<PortId>,
    pub written: BTreeSet<PortId>,
}

impl PortUsage {
    /// Every distinct port, read or written
    pub fn all(&self) -> BTreeSet<PortId> {
        self.read.union(&self.written).copied().collect()
    }
}

/// Collects the ports an `SsaModule` reads and writes
#[derive(Debug, Default)]
pub struct PortCollector;

impl PortCollector {
    pub fn new() -> Self {
        Self
    }
}

impl SsaModuleConsumer for PortCollector {
    type Output = PortUsage;

    fn consume(&mut self, module: &SsaModule) -> SSAResult<PortUsage> {
        let mut usage = PortUsage::default();
        for block in module.reachable_blocks() {
            for &v in &module.block(block)?.instructions {
                let Some(io) = module.value(v)?.as_instruction().and_then(|i| i.io) else {
                    continue;
                };
                match io.direction {
                    IoDirection::Read => usage.read.insert(io.port),
                    IoDirection::Write => usage.written.insert(io.port),
                };
            }
        }
        Ok(usage)
    }
}

/// Distinct ports touched by `module`
pub fn collect_ports(module: &SsaModule) -> SSAResult<BTreeSet<PortId>> {
    Ok(PortCollector::new().consume(module)?.all())
}
