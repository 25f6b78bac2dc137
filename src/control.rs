use parking_lot::RwLock;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Pause/resume/quit state of the generation loop.
///
/// `Running` and `Paused` flip either way; `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

/// Shared run-state cell, written by the control task and read by the loop.
pub struct StateCell {
    state: RwLock<RunState>,
}

impl StateCell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(RunState::Running),
        })
    }

    pub fn get(&self) -> RunState {
        *self.state.read()
    }

    /// Apply one operator keystroke. Returns the new state when it changed.
    ///
    /// `p` pauses while running, `r` resumes while paused, `q` stops from
    /// anywhere. Everything else (including redundant `p`/`r`) is a no-op.
    pub fn apply(&self, input: char) -> Option<RunState> {
        let mut state = self.state.write();

        let next = match (*state, input.to_ascii_lowercase()) {
            (RunState::Stopped, _) => return None,
            (_, 'q') => RunState::Stopped,
            (RunState::Running, 'p') => RunState::Paused,
            (RunState::Paused, 'r') => RunState::Running,
            _ => return None,
        };

        *state = next;
        Some(next)
    }
}

/// Puts the terminal into non-canonical mode so keystrokes arrive without
/// Enter, restoring the original settings on drop.
///
/// `enable` returns `None` when stdin is not a tty (or the platform has no
/// termios); commands then arrive line-buffered instead.
#[cfg(unix)]
pub struct RawModeGuard {
    original: libc::termios,
}

#[cfg(unix)]
impl RawModeGuard {
    pub fn enable() -> Option<Self> {
        unsafe {
            let fd = libc::STDIN_FILENO;
            if libc::isatty(fd) == 0 {
                return None;
            }

            let mut term: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut term) != 0 {
                return None;
            }
            let original = term;

            term.c_lflag &= !(libc::ICANON | libc::ECHO);
            term.c_cc[libc::VMIN] = 1;
            term.c_cc[libc::VTIME] = 0;
            if libc::tcsetattr(fd, libc::TCSANOW, &term) != 0 {
                return None;
            }

            Some(Self { original })
        }
    }
}

#[cfg(unix)]
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.original);
        }
    }
}

#[cfg(not(unix))]
pub struct RawModeGuard;

#[cfg(not(unix))]
impl RawModeGuard {
    pub fn enable() -> Option<Self> {
        None
    }
}

pub fn print_instructions() {
    println!();
    println!("Keyboard Commands:");
    println!("p: Pause");
    println!("r: Resume");
    println!("q: Quit");
}

/// Read operator keystrokes from stdin, one byte at a time, off the loop's
/// timeline. The task ends when `q` arrives or stdin closes. Pair with
/// [`RawModeGuard::enable`] so single keystrokes arrive without Enter.
pub fn spawn_input_task(cell: Arc<StateCell>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let mut buf = [0u8; 1];

        loop {
            match stdin.read(&mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let ch = buf[0] as char;
                    if ch == '\n' || ch == '\r' {
                        continue;
                    }

                    match cell.apply(ch) {
                        Some(RunState::Paused) => info!(">> Paused"),
                        Some(RunState::Running) => info!(">> Resumed"),
                        Some(RunState::Stopped) => info!(">> Quitting..."),
                        None => {}
                    }

                    print_instructions();

                    if cell.get() == RunState::Stopped {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Control input unavailable: {}", e);
                    break;
                }
            }
        }
    })
}
