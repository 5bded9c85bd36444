use crate::tui::TuiMsg;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

const INPUT_POLL: Duration = Duration::from_millis(100);
pub const TICK_RATE: Duration = Duration::from_millis(80);

/// Start the terminal input reader and the redraw ticker. Both stop when
/// `shutdown` is cancelled or the UI loop drops its receiver.
pub fn spawn_tui_feeders(tx: mpsc::Sender<TuiMsg>, shutdown: CancellationToken) {
    let tx_in = tx.clone();
    let shutdown_input = shutdown.clone();
    // One blocking thread for the whole session; polling lets it notice
    // cancellation between keystrokes.
    tokio::task::spawn_blocking(move || {
        while !shutdown_input.is_cancelled() {
            match crossterm::event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => match crossterm::event::read() {
                    Ok(ev) => {
                        if tx_in.blocking_send(TuiMsg::InputEvent(ev)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx_in.blocking_send(TuiMsg::OpError(format!("input: {e}")));
                        break;
                    }
                },
                Err(e) => {
                    let _ = tx_in.blocking_send(TuiMsg::OpError(format!("input: {e}")));
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = time::interval(TICK_RATE);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if tx.is_closed() {
                        break;
                    }
                    let _ = tx.try_send(TuiMsg::Tick);
                }
            }
        }
    });
}
