pub mod collect_ports;

pub use collect_ports::{collect_ports, PortCollector, PortUsage};
