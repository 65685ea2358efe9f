pub mod address;
pub mod error;
pub mod types;

pub use address::Address;
pub use error::{SwapError, SwapResult};
pub use types::*;
