pub mod context;
pub mod dispatch;
pub mod seed;
pub mod status;

pub use context::AppContext;
pub use dispatch::dispatch;
