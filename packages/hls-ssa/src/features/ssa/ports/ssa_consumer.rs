use crate::features::ssa::domain::SsaModule;
use crate::features::ssa::infrastructure::SSAResult;

/// Downstream stage fed with a finished module (IR translation, netlist
/// generation, port bookkeeping)
pub trait SsaModuleConsumer {
    type Output;

    fn consume(&mut self, module: &SsaModule) -> SSAResult<Self::Output>;
}
