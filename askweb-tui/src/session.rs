//! UI-independent session state: the Input/Result state machine.
//!
//! The terminal front end only translates keys into calls on [`Session`] and
//! renders its state, so every transition here is testable without a
//! terminal.
use crate::clipboard::{self, ClipboardMethod};
use crate::input::LineInput;
use crate::workflow::{RunOutcome, Workflow};
use askweb_common::{Query, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Input,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Failure,
    Success,
}

/// Transient toast-like message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: Option<String>,
}

impl Notice {
    pub fn failure(title: impl Into<String>, message: Option<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            title: title.into(),
            message,
        }
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: title.into(),
            message: None,
        }
    }
}

/// What a started run needs; the session is marked running until
/// [`Session::finish_run`] is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub query: Query,
    pub use_web: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginRun {
    Started(RunTicket),
    /// A run is already in flight; nothing changed.
    Busy,
    /// The question was blank; a failure notice was posted.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Busy,
    Rejected,
    Answered,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Session {
    view: View,
    input: LineInput,
    use_web: bool,
    running: bool,
    answer: String,
    context: String,
    show_context: bool,
    scroll: u16,
    scroll_limit: u16,
    notice: Option<Notice>,
}

impl Session {
    pub fn new(initial_query: Option<&str>, use_web: bool) -> Self {
        Self {
            view: View::Input,
            input: LineInput::new(initial_query.unwrap_or_default()),
            use_web,
            running: false,
            answer: String::new(),
            context: String::new(),
            show_context: false,
            scroll: 0,
            scroll_limit: u16::MAX,
            notice: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn input(&self) -> &LineInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut LineInput {
        &mut self.input
    }

    pub fn use_web(&self) -> bool {
        self.use_web
    }

    pub fn toggle_web(&mut self) {
        self.use_web = !self.use_web;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn show_context(&self) -> bool {
        self.show_context
    }

    pub fn toggle_context(&mut self) {
        if self.view == View::Result {
            self.show_context = !self.show_context;
            self.scroll = 0;
        }
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn scroll_by(&mut self, delta: i16) {
        self.scroll = self
            .scroll
            .saturating_add_signed(delta)
            .min(self.scroll_limit);
    }

    /// Largest offset the last rendered frame could show; later scrolling
    /// stops there.
    pub fn set_scroll_limit(&mut self, limit: u16) {
        self.scroll_limit = limit;
        self.scroll = self.scroll.min(limit);
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn post_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Validate the question and mark the session running.
    pub fn begin_run(&mut self) -> BeginRun {
        if self.running {
            return BeginRun::Busy;
        }
        let query = match Query::parse(self.input.as_str()) {
            Ok(q) => q,
            Err(e) => {
                self.notice = Some(Notice::failure(e.to_string(), None));
                return BeginRun::Rejected;
            }
        };
        self.running = true;
        self.notice = None;
        BeginRun::Started(RunTicket {
            query,
            use_web: self.use_web,
        })
    }

    /// Record the result of a run started with [`begin_run`](Self::begin_run).
    pub fn finish_run(&mut self, result: Result<RunOutcome>) -> RunStatus {
        self.running = false;
        match result {
            Ok(outcome) => {
                self.answer = outcome.answer;
                self.context = outcome.context;
                self.show_context = false;
                self.scroll = 0;
                self.view = View::Result;
                RunStatus::Answered
            }
            Err(e) => {
                tracing::warn!(error = %e, "run failed");
                self.notice = Some(Notice::failure("Failed", Some(e.to_string())));
                RunStatus::Failed
            }
        }
    }

    /// Begin, await, and finish a run in one call.
    pub async fn run(&mut self, workflow: &Workflow) -> RunStatus {
        match self.begin_run() {
            BeginRun::Busy => RunStatus::Busy,
            BeginRun::Rejected => RunStatus::Rejected,
            BeginRun::Started(ticket) => {
                let result = workflow.answer(&ticket.query, ticket.use_web).await;
                self.finish_run(result)
            }
        }
    }

    /// Back to the form with answer and context cleared. The question is
    /// kept for editing.
    pub fn ask_another(&mut self) {
        self.view = View::Input;
        self.answer.clear();
        self.context.clear();
        self.show_context = false;
        self.scroll = 0;
        self.notice = None;
    }

    pub fn copy_answer(&mut self) -> Result<ClipboardMethod> {
        self.copy_answer_with(clipboard::copy_to_clipboard)
    }

    pub fn copy_answer_with<F>(&mut self, copy: F) -> Result<ClipboardMethod>
    where
        F: FnOnce(&str) -> Result<ClipboardMethod>,
    {
        match copy(&self.answer) {
            Ok(method) => {
                self.notice = Some(Notice::success("Copied to clipboard"));
                Ok(method)
            }
            Err(e) => {
                self.notice = Some(Notice::failure("Copy failed", Some(e.to_string())));
                Err(e)
            }
        }
    }
}
