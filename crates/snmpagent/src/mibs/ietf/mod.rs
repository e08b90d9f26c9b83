//! Standard MIBs.

pub mod rfc1213;
pub mod rfc3433;
pub mod rfc4292;
pub mod rfc4363;

pub use rfc1213::{ArpEntry, ArpSource, ArpUpdater, InterfacesUpdater, ProcArpTable};
pub use rfc3433::PhysicalSensorUpdater;
pub use rfc4292::RouteUpdater;
pub use rfc4363::FdbUpdater;
