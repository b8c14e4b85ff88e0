//! Session and iteration tracking.
//!
//! A session is an ordered history of prompt/response iterations. The
//! tracker appends iterations, moves an active-iteration pointer through
//! the history, diffs code between iterations, and builds follow-up
//! prompts that carry earlier code into an edit request.
//!
//! ```text
//! EMPTY ──add_iteration──▶ ACTIVE ──add_iteration──▶ ACTIVE
//!   │                        │
//!   └──────delete_session────┴──▶ (gone)
//! ```

pub mod diff;
pub mod model;
pub mod repository;
pub mod tracker;

pub use diff::DiffPair;
pub use model::{
    Direction, EditAction, EditRequest, EditTarget, Iteration, Prompt, Session, SessionId,
    SessionState,
};
pub use repository::SessionRepository;
pub use tracker::SessionTracker;
