use crate::session::{BeginRun, RunTicket, Session, View};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Side effect the event loop must perform after a key was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    None,
    Spawn(RunTicket),
    Copy,
    Quit,
}

const PAGE: i16 = 10;

/// Apply one key press to the session. Pure state changes happen here; I/O
/// is requested through the returned action.
pub fn apply_key(session: &mut Session, key: KeyEvent) -> KeyAction {
    if matches!(
        (key.code, key.modifiers),
        (KeyCode::Char('c' | 'q'), KeyModifiers::CONTROL)
    ) {
        return KeyAction::Quit;
    }

    session.dismiss_notice();

    match session.view() {
        View::Input => input_key(session, key),
        View::Result => result_key(session, key),
    }
}

fn input_key(session: &mut Session, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Enter => match session.begin_run() {
            BeginRun::Started(ticket) => return KeyAction::Spawn(ticket),
            BeginRun::Busy | BeginRun::Rejected => {}
        },
        KeyCode::Tab | KeyCode::BackTab => session.toggle_web(),
        KeyCode::Left => session.input_mut().left(),
        KeyCode::Right => session.input_mut().right(),
        KeyCode::Home => session.input_mut().home(),
        KeyCode::End => session.input_mut().end(),
        KeyCode::Backspace => session.input_mut().backspace(),
        KeyCode::Delete => session.input_mut().delete(),
        KeyCode::Esc => session.input_mut().clear(),
        KeyCode::Char(ch)
            if key.modifiers == KeyModifiers::NONE || key.modifiers == KeyModifiers::SHIFT =>
        {
            session.input_mut().insert(ch)
        }
        _ => {}
    }
    KeyAction::None
}

fn result_key(session: &mut Session, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') => return KeyAction::Quit,
        KeyCode::Char('c') => return KeyAction::Copy,
        KeyCode::Char('n') | KeyCode::Esc => session.ask_another(),
        KeyCode::Char('s') => session.toggle_context(),
        KeyCode::Up | KeyCode::Char('k') => session.scroll_by(-1),
        KeyCode::Down | KeyCode::Char('j') => session.scroll_by(1),
        KeyCode::PageUp => session.scroll_by(-PAGE),
        KeyCode::PageDown | KeyCode::Char(' ') => session.scroll_by(PAGE),
        _ => {}
    }
    KeyAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::RunOutcome;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(s: &mut Session, text: &str) {
        for ch in text.chars() {
            assert_eq!(apply_key(s, press(KeyCode::Char(ch))), KeyAction::None);
        }
    }

    #[test]
    fn typing_and_enter_spawns_a_run() {
        let mut s = Session::new(None, true);
        type_text(&mut s, "hi there");
        assert_eq!(s.input().as_str(), "hi there");

        match apply_key(&mut s, press(KeyCode::Enter)) {
            KeyAction::Spawn(t) => {
                assert_eq!(t.query.as_str(), "hi there");
                assert!(t.use_web);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(s.is_running());
        assert_eq!(apply_key(&mut s, press(KeyCode::Enter)), KeyAction::None);
    }

    #[test]
    fn enter_on_blank_posts_notice() {
        let mut s = Session::new(Some("  "), true);
        assert_eq!(apply_key(&mut s, press(KeyCode::Enter)), KeyAction::None);
        assert!(s.notice().is_some());
        assert!(!s.is_running());
        // next key clears the notice
        apply_key(&mut s, press(KeyCode::Char('a')));
        assert!(s.notice().is_none());
    }

    #[test]
    fn tab_toggles_web_search() {
        let mut s = Session::new(None, true);
        apply_key(&mut s, press(KeyCode::Tab));
        assert!(!s.use_web());
        apply_key(&mut s, press(KeyCode::Tab));
        assert!(s.use_web());
    }

    #[test]
    fn ctrl_c_quits_from_any_view() {
        let mut s = Session::new(Some("q"), true);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(apply_key(&mut s, ctrl_c), KeyAction::Quit);
        assert_eq!(s.input().as_str(), "q");
    }

    #[test]
    fn result_view_keys() {
        let mut s = Session::new(Some("q"), true);
        let _ = s.begin_run();
        s.finish_run(Ok(RunOutcome {
            answer: "A".into(),
            context: "C".into(),
            prompt: String::new(),
        }));

        assert_eq!(apply_key(&mut s, press(KeyCode::Char('c'))), KeyAction::Copy);
        apply_key(&mut s, press(KeyCode::Char('s')));
        assert!(s.show_context());
        apply_key(&mut s, press(KeyCode::Down));
        assert_eq!(s.scroll(), 1);
        apply_key(&mut s, press(KeyCode::PageUp));
        assert_eq!(s.scroll(), 0);

        apply_key(&mut s, press(KeyCode::Char('n')));
        assert_eq!(s.view(), View::Input);
        assert_eq!(s.answer(), "");

        // 'q' is text again on the form
        apply_key(&mut s, press(KeyCode::Char('q')));
        assert_eq!(s.input().as_str(), "qq");
    }

    #[test]
    fn q_quits_result_view() {
        let mut s = Session::new(Some("q"), true);
        let _ = s.begin_run();
        s.finish_run(Ok(RunOutcome::default()));
        assert_eq!(apply_key(&mut s, press(KeyCode::Char('q'))), KeyAction::Quit);
    }

    #[test]
    fn esc_on_result_goes_back_to_the_form() {
        let mut s = Session::new(Some("q"), true);
        let _ = s.begin_run();
        s.finish_run(Ok(RunOutcome {
            answer: "A".into(),
            context: "C".into(),
            prompt: String::new(),
        }));

        assert_eq!(apply_key(&mut s, press(KeyCode::Esc)), KeyAction::None);
        assert_eq!(s.view(), View::Input);
        assert_eq!(s.answer(), "");
        assert_eq!(s.context(), "");
        assert_eq!(s.input().as_str(), "q");
    }
}
