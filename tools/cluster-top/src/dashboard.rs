//! The poll loop: fetch, build components, paint, wait, repeat.

use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ClusterMetadataSource;
use crate::domain::{
    App, AppState, Intent, Screen, SnapshotError, SystemMetricsCollector, TopologySnapshotBuilder,
    Update,
};
use crate::ui::{screens, Component, LayoutError, Painter, RenderPipeline};

/// Errors surfaced by the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("Logging setup failed: {0}")]
    Logging(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("Malformed table: {0}")]
    Layout(#[from] LayoutError),
}

/// Owns the application model, the render pipeline and the painter.
///
/// All state changes happen here, on the task driving [`run`](Self::run).
pub struct Dashboard<P: Painter> {
    source: Arc<dyn ClusterMetadataSource>,
    painter: P,
    app: App,
    pipeline: RenderPipeline,
    /// Components of the last successful fetch for the current screen.
    content: Vec<Component>,
    refresh_interval: Duration,
}

impl<P: Painter> Dashboard<P> {
    pub fn new(
        source: Arc<dyn ClusterMetadataSource>,
        painter: P,
        screen: Screen,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            source,
            painter,
            app: App::new(screen),
            pipeline: RenderPipeline::new(),
            content: Vec::new(),
            refresh_interval,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    /// Run until quit is requested or `cancel` fires.
    ///
    /// Cancelling drops an in-flight fetch. Ticks run back to back with `refresh_interval` between the end of one
    /// and the start of the next. Intents arriving while waiting are applied
    /// immediately and repaint from cached content.
    pub async fn run(
        &mut self,
        mut intents: UnboundedReceiver<Intent>,
        cancel: CancellationToken,
    ) -> Result<(), DashboardError> {
        info!(screen = %self.app.screen, interval_ms = self.refresh_interval.as_millis() as u64, "dashboard started");
        let mut keys_open = true;

        'ticks: loop {
            while let Ok(intent) = intents.try_recv() {
                if self.absorb(intent).is_break() {
                    break 'ticks;
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("dashboard cancelled during refresh");
                    break 'ticks;
                }
                result = self.tick() => result?,
            }

            let sleep = tokio::time::sleep(self.refresh_interval);
            tokio::pin!(sleep);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!("dashboard cancelled");
                        break 'ticks;
                    }
                    intent = intents.recv(), if keys_open => match intent {
                        Some(intent) => {
                            if self.handle(intent).await?.is_break() {
                                break 'ticks;
                            }
                        }
                        None => {
                            debug!("intent channel closed");
                            keys_open = false;
                        }
                    },
                    _ = &mut sleep => break,
                }
            }
        }

        info!("dashboard stopped");
        Ok(())
    }

    /// Refresh the current screen and paint it.
    pub async fn tick(&mut self) -> Result<(), DashboardError> {
        if self.app.state == AppState::Dashboard {
            self.refresh().await;
        }
        self.paint()
    }

    /// Apply one intent and carry out its follow-up right away.
    pub async fn handle(&mut self, intent: Intent) -> Result<ControlFlow<()>, DashboardError> {
        match self.app.apply(intent) {
            Update::None => {}
            Update::Repaint => self.paint()?,
            Update::Refresh => {
                self.content.clear();
                self.refresh().await;
                self.paint()?;
            }
            Update::Sort(column) => {
                self.pipeline.select_sort_column(column);
                self.paint()?;
            }
            Update::Quit => return Ok(ControlFlow::Break(())),
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Apply a queued intent without painting; the coming tick fetches and paints.
    fn absorb(&mut self, intent: Intent) -> ControlFlow<()> {
        match self.app.apply(intent) {
            Update::Quit => ControlFlow::Break(()),
            Update::Sort(column) => {
                self.pipeline.select_sort_column(column);
                ControlFlow::Continue(())
            }
            Update::Refresh => {
                self.content.clear();
                ControlFlow::Continue(())
            }
            Update::None | Update::Repaint => ControlFlow::Continue(()),
        }
    }

    /// Fetch the current screen. A failure keeps the previous content.
    async fn refresh(&mut self) {
        match self.fetch(self.app.screen).await {
            Ok(content) => {
                self.content = content;
                self.app.refreshed();
            }
            Err(e) => {
                warn!(screen = %self.app.screen, error = %e, "refresh failed");
                self.app.refresh_failed(e);
            }
        }
    }

    async fn fetch(&self, screen: Screen) -> Result<Vec<Component>, DashboardError> {
        let components = match screen {
            Screen::Topology => {
                let snapshot = TopologySnapshotBuilder::new(self.source.clone()).build().await?;
                screens::topology(&snapshot)?
            }
            Screen::SystemMetrics => {
                let metrics = SystemMetricsCollector::new(self.source.clone()).collect().await?;
                screens::system_metrics(&metrics)?
            }
        };
        Ok(components)
    }

    fn paint(&mut self) -> Result<(), DashboardError> {
        let mut components = match self.app.state {
            AppState::Help => screens::help(),
            AppState::Dashboard | AppState::Quit => self.content.clone(),
        };
        components.push(screens::status(&self.app));

        self.pipeline.set_components(components);
        let lines = self.pipeline.render(self.painter.width());
        self.painter.paint(lines)?;
        Ok(())
    }
}
