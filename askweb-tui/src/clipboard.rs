use askweb_common::{AskwebError, Result};
use base64::Engine;
use std::io::Write;
use std::process::{Command, Stdio};

/// Which mechanism accepted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMethod {
    Osc52,
    Native(&'static str),
}

/// Copy text using OSC 52 (works over tmux/ssh), falling back to native
/// clipboard tools.
pub fn copy_to_clipboard(text: &str) -> Result<ClipboardMethod> {
    let seq = osc52_sequence(text, std::env::var_os("TMUX").is_some());
    let mut stdout = std::io::stdout().lock();
    if stdout.write_all(seq.as_bytes()).is_ok() && stdout.flush().is_ok() {
        return Ok(ClipboardMethod::Osc52);
    }
    drop(stdout);
    copy_native(text)
}

/// The OSC 52 escape for `text`, wrapped in a DCS passthrough inside tmux.
pub fn osc52_sequence(text: &str, in_tmux: bool) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    if in_tmux {
        format!("\x1bPtmux;\x1b\x1b]52;c;{encoded}\x07\x1b\\")
    } else {
        format!("\x1b]52;c;{encoded}\x07")
    }
}

fn copy_native(text: &str) -> Result<ClipboardMethod> {
    let try_command = |cmd: &str, args: &[&str]| -> bool {
        let Ok(mut child) = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            return false;
        };
        let wrote = child
            .stdin
            .take()
            .map(|mut stdin| stdin.write_all(text.as_bytes()).is_ok())
            .unwrap_or(false);
        wrote && child.wait().map(|s| s.success()).unwrap_or(false)
    };

    if std::env::var_os("WAYLAND_DISPLAY").is_some() && try_command("wl-copy", &[]) {
        return Ok(ClipboardMethod::Native("wl-copy"));
    }
    if try_command("xclip", &["-selection", "clipboard"]) {
        return Ok(ClipboardMethod::Native("xclip"));
    }
    if try_command("xsel", &["--clipboard", "--input"]) {
        return Ok(ClipboardMethod::Native("xsel"));
    }
    if try_command("pbcopy", &[]) {
        return Ok(ClipboardMethod::Native("pbcopy"));
    }

    Err(AskwebError::Clipboard("no clipboard tool available".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc52_encodes_payload() {
        assert_eq!(osc52_sequence("hi", false), "\x1b]52;c;aGk=\x07");
    }

    #[test]
    fn osc52_wraps_for_tmux() {
        let seq = osc52_sequence("hi", true);
        assert!(seq.starts_with("\x1bPtmux;"));
        assert!(seq.contains("]52;c;aGk="));
        assert!(seq.ends_with("\x1b\\"));
    }
}
