//! Terminal output.

use std::io::{self, Stdout};

use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    text::Line,
    widgets::Paragraph,
    Terminal,
};

/// Width assumed when the terminal size cannot be read.
pub const DEFAULT_WIDTH: usize = 80;

/// Where rendered lines end up.
pub trait Painter {
    /// Current width in columns.
    fn width(&self) -> usize;

    /// Replace the screen with `lines`.
    fn paint(&mut self, lines: Vec<Line<'static>>) -> io::Result<()>;
}

/// [`Painter`] drawing through a ratatui terminal.
pub struct TerminalPainter<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalPainter<B> {
    pub fn new(backend: B) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(backend)?,
        })
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Painter for TerminalPainter<B> {
    fn width(&self) -> usize {
        self.terminal
            .size()
            .map(|size| usize::from(size.width))
            .unwrap_or(DEFAULT_WIDTH)
    }

    fn paint(&mut self, lines: Vec<Line<'static>>) -> io::Result<()> {
        self.terminal.draw(|frame| {
            frame.render_widget(Paragraph::new(lines), frame.area());
        })?;
        Ok(())
    }
}

/// Enter raw mode on the alternate screen.
pub fn setup_terminal() -> io::Result<TerminalPainter<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    TerminalPainter::new(CrosstermBackend::new(stdout))
}

/// Leave raw mode and the alternate screen.
pub fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)
}

/// Restore the terminal before the default panic output is printed.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));
}
