// Domain layer: property/event types and the ports to the rendering layer.

pub mod model;
pub mod ports;
