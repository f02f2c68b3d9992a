// Domain layer: row/record models and ports. No model runtime types here.

pub mod model;
pub mod ports;
