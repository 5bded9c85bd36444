use crate::session::{NoticeKind, Session, View};
use crate::styles;
use anyhow::Result;
use askweb_common::PromptStyle;
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use textwrap::wrap;

const EMPTY_ANSWER: &str = "(the model returned an empty response)";
const NO_CONTEXT: &str = "(no web context for this answer)";

/// Borrowed view of everything one frame needs.
pub struct ViewSnap<'a> {
    pub session: &'a Session,
    pub spinner: &'static str,
    pub model: &'a str,
    pub style: PromptStyle,
}

/// Render one frame and return the largest useful scroll offset for the
/// panes on screen (0 on the form).
pub fn draw<B: Backend>(term: &mut Terminal<B>, snap: &ViewSnap<'_>) -> Result<u16> {
    let mut scroll_limit = 0;
    term.draw(|frame| match snap.session.view() {
        View::Input => draw_form(frame, snap),
        View::Result => scroll_limit = draw_result(frame, snap),
    })?;
    Ok(scroll_limit)
}

fn header(frame: &mut Frame, area: Rect, snap: &ViewSnap<'_>) {
    let style = match snap.style {
        PromptStyle::Plain => "plain",
        PromptStyle::Cited => "cited",
    };
    let line = Line::from(vec![
        Span::styled(" askweb ", styles::title()),
        Span::styled(format!("· {} · {style} prompt", snap.model), styles::dim()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_form(frame: &mut Frame, snap: &ViewSnap<'_>) {
    let session = snap.session;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(frame.area());

    header(frame, layout[0], snap);

    let input = session.input();
    let question = Paragraph::new(input.as_str())
        .block(Block::default().borders(Borders::ALL).title(" Question "));
    frame.render_widget(Clear, layout[1]);
    frame.render_widget(question, layout[1]);

    let caret_x = layout[1].x + 1 + visual_caret_col(input.as_str(), input.cursor());
    frame.set_cursor_position(Position {
        x: caret_x.min(layout[1].right().saturating_sub(2)),
        y: layout[1].y + 1,
    });

    let mark = if session.use_web() { "[x]" } else { "[ ]" };
    let checkbox = Line::from(vec![
        Span::raw(" "),
        Span::styled(mark, styles::label()),
        Span::raw(" Use web search"),
        Span::styled("  (Tab to toggle)", styles::dim()),
    ]);
    frame.render_widget(Paragraph::new(checkbox), layout[2]);

    let hint = if session.is_running() {
        " Running… "
    } else {
        " Enter: ask · Esc: clear · Ctrl-C: quit "
    };
    status_bar(frame, layout[4], snap, hint);
}

fn draw_result(frame: &mut Frame, snap: &ViewSnap<'_>) -> u16 {
    let session = snap.session;
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    header(frame, layout[0], snap);

    let (answer_area, context_area) = if session.show_context() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);
        (cols[0], Some(cols[1]))
    } else {
        (layout[1], None)
    };

    let body = if session.answer().is_empty() {
        (EMPTY_ANSWER, styles::dim())
    } else {
        (session.answer(), styles::answer_text())
    };
    let blocks = [
        ("# Answer", styles::answer_header()),
        ("", Style::default()),
        body,
    ];
    let mut limit = scrolled_pane(frame, answer_area, " Answer ", &blocks, session.scroll());

    if let Some(area) = context_area {
        let ctx = if session.context().is_empty() {
            (NO_CONTEXT, styles::dim())
        } else {
            (session.context(), styles::context_text())
        };
        limit = limit.max(scrolled_pane(frame, area, " Web context ", &[ctx], session.scroll()));
    }

    status_bar(
        frame,
        layout[2],
        snap,
        " c: copy · n/Esc: ask another · s: context · ↑↓: scroll · q: quit ",
    );
    limit
}

/// Returns the offset that brings the last wrapped line to the bottom.
fn scrolled_pane(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    blocks: &[(&str, Style)],
    scroll: u16,
) -> u16 {
    let visible_h = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let wrapped = wrap_lines(blocks, width);
    let max_start = wrapped.len().saturating_sub(visible_h);
    let start = (scroll as usize).min(max_start);
    let end = (start + visible_h).min(wrapped.len());

    let lines: Vec<Line> = wrapped[start..end]
        .iter()
        .map(|(text, style)| Line::from(Span::styled(text.clone(), *style)))
        .collect();

    let pane = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(pane, area);
    u16::try_from(max_start).unwrap_or(u16::MAX)
}

fn status_bar(frame: &mut Frame, area: Rect, snap: &ViewSnap<'_>, hint: &str) {
    let session = snap.session;
    let mut spans = vec![Span::raw(" ")];
    if session.is_running() {
        spans.push(Span::styled(snap.spinner, styles::busy()));
        spans.push(Span::styled(" Running…", styles::busy()));
    } else {
        spans.push(Span::styled("Ready", styles::idle()));
    }

    if let Some(notice) = session.notice() {
        let style = match notice.kind {
            NoticeKind::Failure => styles::error(),
            NoticeKind::Success => styles::success(),
        };
        spans.push(Span::raw(" • "));
        spans.push(Span::styled(notice.title.clone(), style));
        if let Some(msg) = &notice.message {
            spans.push(Span::styled(format!(": {msg}"), style));
        }
    }

    let status = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Status ")
            .title_bottom(Line::styled(hint.to_string(), styles::dim())),
    );
    frame.render_widget(status, area);
}

fn visual_caret_col(input: &str, cursor: usize) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(&input[..cursor]) as u16
}

/// Hard-wrap each block to `width`, keeping blank lines and block styles.
fn wrap_lines(blocks: &[(&str, Style)], width: usize) -> Vec<(String, Style)> {
    let effective_width = width.max(1);
    let mut out = Vec::new();

    for (text, style) in blocks {
        if text.is_empty() {
            out.push((String::new(), *style));
            continue;
        }

        for raw_line in text.split('\n') {
            if raw_line.is_empty() {
                out.push((String::new(), *style));
                continue;
            }

            let segments = wrap(raw_line, effective_width);
            if segments.is_empty() {
                out.push((String::new(), *style));
            } else {
                out.extend(segments.into_iter().map(|seg| (seg.into_owned(), *style)));
            }
        }
    }

    out
}
