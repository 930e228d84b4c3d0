//! Chain client implementations.

mod simulated;

pub use simulated::SimulatedChainClient;
