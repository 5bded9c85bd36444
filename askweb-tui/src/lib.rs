//! Presentation layer: the Input/Result session, the question workflow, and
//! the ratatui front end that drives them.
mod clipboard;
mod feeders;
mod input;
mod keys;
mod session;
mod styles;
mod tui;
mod view;
mod workflow;

pub use clipboard::{ClipboardMethod, copy_to_clipboard};
pub use input::LineInput;
pub use keys::{KeyAction, apply_key};
pub use session::{BeginRun, Notice, NoticeKind, RunStatus, RunTicket, Session, View};
pub use tui::{TuiApp, TuiMsg};
pub use workflow::{RunOutcome, Workflow};
