//! Infrastructure layer: the transport implementations that carry raw lines
//! between the driver and the switch.

pub mod transport;
