//! Key reading on a blocking thread.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{Intent, Screen};

/// How long a single poll blocks before cancellation is checked again.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Map a key press to an intent.
pub fn intent_for_key(key: KeyEvent) -> Option<Intent> {
    // Only handle key press events (not release)
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Intent::Quit),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Intent::Quit),
        KeyCode::Char('t') | KeyCode::Char('T') => Some(Intent::Show(Screen::Topology)),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Intent::Show(Screen::SystemMetrics)),
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => Some(Intent::ToggleHelp),
        // '1' is the first column, '0' maps to -1
        KeyCode::Char(digit @ '0'..='9') => Some(Intent::SortBy(digit as isize - '1' as isize)),
        _ => None,
    }
}

/// Read events until cancelled, the input ends or nobody listens any more.
///
/// `next_event` returns `Ok(None)` when no event arrived in time.
pub fn read_keys<F>(mut next_event: F, intents: UnboundedSender<Intent>, cancel: CancellationToken)
where
    F: FnMut() -> io::Result<Option<Event>>,
{
    while !cancel.is_cancelled() {
        let event = match next_event() {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) if matches!(e.kind(), io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof) => {
                debug!(error = %e, "key input ended");
                return;
            }
            Err(e) => {
                warn!(error = %e, "reading key input failed");
                return;
            }
        };

        let Event::Key(key) = event else {
            continue;
        };

        if let Some(intent) = intent_for_key(key) {
            if intents.send(intent).is_err() {
                debug!("intent channel closed");
                return;
            }
        }
    }

    debug!("key reader cancelled");
}

/// Poll crossterm for one event.
pub fn poll_terminal_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// Start reading terminal keys on a blocking thread.
pub fn spawn_key_reader(
    intents: UnboundedSender<Intent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        read_keys(|| poll_terminal_event(POLL_INTERVAL), intents, cancel)
    })
}
