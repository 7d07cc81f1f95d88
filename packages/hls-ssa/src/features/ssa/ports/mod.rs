pub mod ssa_consumer;

pub use ssa_consumer::SsaModuleConsumer;
