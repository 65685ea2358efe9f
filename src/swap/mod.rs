pub mod contract;
pub mod lifecycle;
pub mod offer;
pub mod orchestrator;
pub mod progress;
pub mod store;

pub use contract::SwapContractClient;
pub use lifecycle::{CallbackContext, CallbackRef, NoopCallback, TransactionLifecycleCallback};
pub use offer::{AssetLeg, OfferDraft, OfferStatus, SwapOffer};
pub use orchestrator::{OperationOutcome, SwapOrchestrator};
pub use progress::{OperationKind, ProgressState, ProgressTracker};
pub use store::{InMemoryOfferStore, OfferStore};
