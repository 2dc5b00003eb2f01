//! Reactive state stores shared by the pipeline and the UI.

mod alerts;
mod session;

pub use alerts::{AlertKey, AlertStore};
pub use session::{SessionSnapshot, SessionStore};
