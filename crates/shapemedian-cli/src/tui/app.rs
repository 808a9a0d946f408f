//! TUI application state and event loop.
//!
//! The terminal thread only draws and reads keys. Refresh cycles run as tasks
//! on the tokio runtime through a [`SharedPipeline`], so the UI never blocks
//! on a slow sample and a second trigger during a cycle is refused instead of
//! queued.

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::runtime::Handle;

use shapemedian_core::{PipelineSnapshot, RefreshError, RenderState, SharedPipeline};

pub struct App {
    pipeline: SharedPipeline,
    runtime: Handle,
    auto_interval: Duration,
    auto_refresh: bool,
    running: bool,
    last_trigger: Option<Instant>,
    /// One-line feedback for the last key press.
    notice: Option<String>,
}

impl App {
    pub fn new(pipeline: SharedPipeline, runtime: Handle, interval: Duration, auto: bool) -> Self {
        Self {
            pipeline,
            runtime,
            auto_interval: interval,
            auto_refresh: auto,
            running: true,
            last_trigger: None,
            notice: None,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before printing a panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        self.pipeline.cancel_refresh();
        let status = self.pipeline.snapshot().status;
        println!(
            "{} cycle(s) completed, {} failed",
            status.cycles_completed, status.cycles_failed
        );

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }

            if self.auto_due() {
                self.trigger();
            }
        }

        Ok(())
    }

    pub(crate) fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Char(' ') | KeyCode::Enter => {
                self.trigger();
            }
            KeyCode::Char('a') => {
                self.auto_refresh = !self.auto_refresh;
                self.notice = Some(format!(
                    "auto refresh {}",
                    if self.auto_refresh { "on" } else { "off" }
                ));
            }
            KeyCode::Char('x') => {
                if self.pipeline.is_refreshing() {
                    self.pipeline.cancel_refresh();
                    self.notice = Some("cancelling cycle".to_string());
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.auto_interval += Duration::from_millis(500);
            }
            KeyCode::Char('-') => {
                self.auto_interval = self
                    .auto_interval
                    .saturating_sub(Duration::from_millis(500))
                    .max(Duration::from_millis(500));
            }
            _ => {}
        }
    }

    fn auto_due(&self) -> bool {
        self.auto_refresh
            && !self.pipeline.is_refreshing()
            && self
                .last_trigger
                .is_none_or(|t| t.elapsed() >= self.auto_interval)
    }

    /// Start a cycle in the background unless one is already running.
    fn trigger(&mut self) {
        if self.pipeline.is_refreshing() {
            self.notice = Some("refresh already in progress".to_string());
            return;
        }
        self.notice = None;
        self.last_trigger = Some(Instant::now());
        let pipeline = self.pipeline.clone();
        self.runtime.spawn(async move {
            match pipeline.trigger_refresh().await {
                Ok(_) | Err(RefreshError::InProgress) => {}
                // Failures land in the snapshot's status.
                Err(e) => log::debug!("dashboard cycle failed: {e}"),
            }
        });
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn auto_refresh(&self) -> bool {
        self.auto_refresh
    }

    pub fn auto_interval(&self) -> Duration {
        self.auto_interval
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.pipeline.snapshot()
    }

    pub fn view_state(&self, snapshot: &PipelineSnapshot) -> RenderState {
        snapshot.render_state(self.pipeline.is_refreshing())
    }
}
