//! Client-side state engine for taskdeck: forms, filters, the task list and the session loop.

pub mod filter;
pub mod form;
pub mod options;
pub mod projection;
pub mod session;
pub mod state;
pub mod store;
pub mod telemetry;

pub use filter::FilterController;
pub use form::{FormController, FormMode, SubmitGate, Submission};
pub use options::SessionOptions;
pub use projection::{ListProjection, TaskRow};
pub use session::{Command, Message, Session};
pub use state::{LoadState, Notice, NoticeKind};
pub use store::{Confirm, DeleteOutcome, FetchOutcome, FetchRequest, StaleResponse, TaskStore};

#[cfg(test)]
mod fake;
