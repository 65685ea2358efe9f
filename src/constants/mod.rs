pub mod chain;
pub mod networks;

pub use chain::*;
pub use networks::*;
