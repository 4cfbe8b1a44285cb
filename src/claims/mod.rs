pub mod normalize;
pub mod policy;
pub mod recommendation;

pub use normalize::{normalize_document, normalize_priority, normalize_recommendation};
pub use policy::{ApprovalTier, HandlerActions, PolicyRecord};
pub use recommendation::{Priority, Recommendation};
