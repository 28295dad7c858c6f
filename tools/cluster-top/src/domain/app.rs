//! Application state management.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Data screens the dashboard can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Membership, baseline and cluster facts.
    #[default]
    Topology,
    /// Per-member CPU, heap and storage.
    SystemMetrics,
}

impl Screen {
    pub fn title(&self) -> &'static str {
        match self {
            Screen::Topology => "Topology",
            Screen::SystemMetrics => "System metrics",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Screen {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "topology" | "t" => Ok(Screen::Topology),
            "system" | "system-metrics" | "s" => Ok(Screen::SystemMetrics),
            other => Err(format!("unknown screen '{}', expected topology or system", other)),
        }
    }
}

/// Application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Main dashboard view.
    #[default]
    Dashboard,
    /// Help overlay.
    Help,
    /// Quitting.
    Quit,
}

/// What the user asked for, produced by the key reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Sort tables by the zero-based column. Negative columns are ignored.
    SortBy(isize),
    Show(Screen),
    ToggleHelp,
    Quit,
}

/// Follow-up the poll loop performs after applying an [`Intent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Nothing changed.
    None,
    /// Repaint cached content.
    Repaint,
    /// Data screen changed, fetch before painting.
    Refresh,
    /// Sort tables by this column, then repaint.
    Sort(isize),
    Quit,
}

/// Main application model.
#[derive(Debug, Clone, Default)]
pub struct App {
    /// Current application state/view.
    pub state: AppState,
    /// Data screen shown in the dashboard state.
    pub screen: Screen,
    /// Last successful refresh timestamp.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Error of the last failed refresh, cleared on success.
    pub error_message: Option<String>,
}

impl App {
    /// Create a new application instance.
    pub fn new(screen: Screen) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    /// Apply an intent to the state.
    pub fn apply(&mut self, intent: Intent) -> Update {
        match (self.state, intent) {
            (AppState::Quit, _) => Update::None,
            (_, Intent::Quit) => {
                self.state = AppState::Quit;
                Update::Quit
            }
            // Any key closes help
            (AppState::Help, Intent::Show(screen)) => {
                self.state = AppState::Dashboard;
                self.show(screen)
            }
            (AppState::Help, _) => {
                self.state = AppState::Dashboard;
                Update::Repaint
            }
            (AppState::Dashboard, Intent::ToggleHelp) => {
                self.state = AppState::Help;
                Update::Repaint
            }
            (AppState::Dashboard, Intent::Show(screen)) => self.show(screen),
            (AppState::Dashboard, Intent::SortBy(column)) if column >= 0 => Update::Sort(column),
            (AppState::Dashboard, Intent::SortBy(_)) => Update::None,
        }
    }

    fn show(&mut self, screen: Screen) -> Update {
        if self.screen == screen {
            return Update::Repaint;
        }
        self.screen = screen;
        Update::Refresh
    }

    /// Record a successful refresh.
    pub fn refreshed(&mut self) {
        self.last_refresh = Some(Utc::now());
        self.error_message = None;
    }

    /// Record a failed refresh. Cached content stays on screen.
    pub fn refresh_failed(&mut self, error: impl fmt::Display) {
        self.error_message = Some(error.to_string());
    }

    /// Check if the app should quit.
    pub fn should_quit(&self) -> bool {
        self.state == AppState::Quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_from_any_state() {
        let mut app = App::new(Screen::Topology);
        app.state = AppState::Help;

        assert_eq!(app.apply(Intent::Quit), Update::Quit);
        assert!(app.should_quit());
        assert_eq!(app.apply(Intent::ToggleHelp), Update::None);
    }

    #[test]
    fn test_switching_screen_requests_refresh() {
        let mut app = App::new(Screen::Topology);

        assert_eq!(app.apply(Intent::Show(Screen::SystemMetrics)), Update::Refresh);
        assert_eq!(app.screen, Screen::SystemMetrics);
        assert_eq!(app.apply(Intent::Show(Screen::SystemMetrics)), Update::Repaint);
    }

    #[test]
    fn test_help_closes_on_any_intent() {
        let mut app = App::default();

        assert_eq!(app.apply(Intent::ToggleHelp), Update::Repaint);
        assert_eq!(app.state, AppState::Help);

        assert_eq!(app.apply(Intent::SortBy(1)), Update::Repaint);
        assert_eq!(app.state, AppState::Dashboard);
    }

    #[test]
    fn test_show_from_help_switches_screen() {
        let mut app = App::default();
        app.apply(Intent::ToggleHelp);

        assert_eq!(app.apply(Intent::Show(Screen::SystemMetrics)), Update::Refresh);
        assert_eq!(app.state, AppState::Dashboard);
    }

    #[test]
    fn test_negative_sort_column_is_ignored() {
        let mut app = App::default();

        assert_eq!(app.apply(Intent::SortBy(-1)), Update::None);
        assert_eq!(app.apply(Intent::SortBy(2)), Update::Sort(2));
    }

    #[test]
    fn test_refresh_bookkeeping() {
        let mut app = App::default();
        app.refresh_failed("boom");
        assert_eq!(app.error_message.as_deref(), Some("boom"));

        app.refreshed();
        assert!(app.error_message.is_none());
        assert!(app.last_refresh.is_some());
    }

    #[test]
    fn test_screen_from_str() {
        assert_eq!("system".parse::<Screen>(), Ok(Screen::SystemMetrics));
        assert_eq!("Topology".parse::<Screen>(), Ok(Screen::Topology));
        assert!("nope".parse::<Screen>().is_err());
    }
}
