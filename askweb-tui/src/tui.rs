use crate::{
    feeders::{TICK_RATE, spawn_tui_feeders},
    keys::{KeyAction, apply_key},
    session::{Notice, RunTicket, Session},
    view::{self, ViewSnap},
    workflow::{RunOutcome, Workflow},
};
use anyhow::Result;
use askweb_common::AskwebError;
use crossterm::{
    event::{Event as CtEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    future::Future,
    io::{self, Stdout},
    sync::Arc,
    time::Instant,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MAILBOX: usize = 256;

pub enum TuiMsg {
    InputEvent(CtEvent),
    Tick,
    RunDone(askweb_common::Result<RunOutcome>),
    OpError(String),
}

/// Full-screen front end driving a [`Session`].
pub struct TuiApp {
    session: Session,
    workflow: Arc<Workflow>,

    // terminal
    term: Terminal<CrosstermBackend<Stdout>>,
    last_draw: Instant,
    dirty: bool,
    spin_idx: usize,

    // loop plumbing
    tx: mpsc::Sender<TuiMsg>,
    rx: mpsc::Receiver<TuiMsg>,
    shutdown: CancellationToken,
}

impl TuiApp {
    /// Switch the terminal to raw mode and the alternate screen.
    pub fn new(session: Session, workflow: Arc<Workflow>, shutdown: CancellationToken) -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;
        term.clear()?;

        let (tx, rx) = mpsc::channel(MAILBOX);
        Ok(Self {
            session,
            workflow,
            term,
            last_draw: Instant::now(),
            dirty: true,
            spin_idx: 0,
            tx,
            rx,
            shutdown,
        })
    }

    /// Run until the user quits or `shutdown` is cancelled. The terminal is
    /// restored on every exit path.
    pub async fn run(mut self) -> Result<()> {
        spawn_tui_feeders(self.tx.clone(), self.shutdown.clone());
        let result = self.event_loop().await;
        self.shutdown.cancel();
        restore_terminal();
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        self.draw()?;
        loop {
            let msg = tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                msg = self.rx.recv() => msg,
            };
            let Some(msg) = msg else {
                return Ok(());
            };
            if !self.handle(msg)? {
                return Ok(());
            }
        }
    }

    /// Returns `false` once the loop should stop.
    fn handle(&mut self, msg: TuiMsg) -> Result<bool> {
        match msg {
            TuiMsg::InputEvent(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                self.dirty = true;
                match apply_key(&mut self.session, key) {
                    KeyAction::None => {}
                    KeyAction::Spawn(ticket) => self.spawn_run(ticket),
                    KeyAction::Copy => {
                        // Notice is posted by the session either way.
                        let _ = self.session.copy_answer();
                    }
                    KeyAction::Quit => return Ok(false),
                }
            }
            TuiMsg::InputEvent(CtEvent::Resize(..)) => self.dirty = true,
            TuiMsg::InputEvent(_) => {}
            TuiMsg::RunDone(result) => {
                let status = self.session.finish_run(result);
                tracing::debug!(?status, "run finished");
                self.dirty = true;
            }
            TuiMsg::OpError(e) => {
                tracing::error!(error = %e, "tui error");
                self.session.post_notice(Notice::failure("Error", Some(e)));
                self.dirty = true;
            }
            TuiMsg::Tick => {
                if self.session.is_running() {
                    self.spin_idx = (self.spin_idx + 1) % BRAILLE_FRAMES.len();
                    self.dirty = true;
                }
            }
        }

        if self.dirty || self.last_draw.elapsed() >= TICK_RATE * 10 {
            self.draw()?;
        }
        Ok(true)
    }

    fn spawn_run(&self, ticket: RunTicket) {
        let workflow = self.workflow.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result =
                settle_run(async move { workflow.answer(&ticket.query, ticket.use_web).await })
                    .await;
            let _ = tx.send(TuiMsg::RunDone(result)).await;
        });
    }

    fn spinner(&self) -> &'static str {
        if self.session.is_running() {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    fn draw(&mut self) -> Result<()> {
        let snap = ViewSnap {
            session: &self.session,
            spinner: self.spinner(),
            model: self.workflow.model_name(),
            style: self.workflow.style(),
        };
        let scroll_limit = view::draw(&mut self.term, &snap)?;
        self.session.set_scroll_limit(scroll_limit);
        self.last_draw = Instant::now();
        self.dirty = false;
        Ok(())
    }
}

/// Drive `run` on its own task so a panic or abort still yields a result
/// and the session's running flag gets cleared.
async fn settle_run<F>(run: F) -> askweb_common::Result<RunOutcome>
where
    F: Future<Output = askweb_common::Result<RunOutcome>> + Send + 'static,
{
    match tokio::spawn(run).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "run task did not complete");
            let reason = if e.is_panic() { "panicked" } else { "was cancelled" };
            Err(AskwebError::Generation(format!("the run {reason}")))
        }
    }
}

fn restore_terminal() {
    disable_raw_mode().ok();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{BeginRun, RunStatus, View};

    async fn crashing_run() -> askweb_common::Result<RunOutcome> {
        panic!("model backend crashed")
    }

    #[tokio::test]
    async fn panicking_run_still_finishes_the_session() {
        let mut s = Session::new(Some("q"), true);
        let BeginRun::Started(_ticket) = s.begin_run() else {
            panic!("run should start");
        };

        let result = settle_run(crashing_run()).await;
        assert!(matches!(result, Err(AskwebError::Generation(ref m)) if m.contains("panicked")));

        assert_eq!(s.finish_run(result), RunStatus::Failed);
        assert!(!s.is_running());
        assert_eq!(s.view(), View::Input);
        assert!(matches!(s.begin_run(), BeginRun::Started(_)));
    }

    #[tokio::test]
    async fn completed_run_passes_through() {
        let result = settle_run(async {
            Ok(RunOutcome {
                answer: "Paris.".into(),
                ..Default::default()
            })
        })
        .await
        .unwrap();
        assert_eq!(result.answer, "Paris.");
    }
}
