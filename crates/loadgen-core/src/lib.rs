//! Synthetic request generation for the delivery-ETA prediction API.
//!
//! Everything here is pure: callers hand in an RNG and get payloads back.

pub mod kind;
pub mod record;
pub mod scenario;

pub use kind::{rng_from_seed, KindSampler, RequestKind};
pub use record::{BatchRequest, DeliveryRecord};
pub use scenario::ErrorScenario;
