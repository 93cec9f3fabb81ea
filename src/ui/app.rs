use crate::api::CanvasClient;
use crate::export;
use crate::fetcher::{self, AuditProgress, ProgressCallback};
use crate::models::CourseReport;
use crate::parser;
use crate::ui::render::render_ui;
use crate::ui::state::{AppState, FetchProgress, ResultsView};
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyEvent, KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

struct RunningAudit {
    handle: JoinHandle<Vec<CourseReport>>,
    events: UnboundedReceiver<AuditProgress>,
    started: Instant,
}

pub struct App {
    client: CanvasClient,
    state: AppState,
    last_input: String,
    running: Option<RunningAudit>,
}

impl App {
    pub fn new(client: CanvasClient) -> Self {
        Self {
            client,
            state: AppState::Input {
                input: String::new(),
                message: None,
            },
            last_input: String::new(),
            running: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste
        )?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main event loop
        let result = self.event_loop(&mut terminal).await;

        if let Some(running) = self.running.take() {
            running.handle.abort();
        }

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            self.pump_audit().await;

            // Always redraw the UI
            terminal.draw(|f| render_ui(f, &self.state))?;

            // Check for keyboard events with a short timeout
            if event::poll(std::time::Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.handle_key_event(key) {
                            break; // User quit
                        }
                    }
                    Event::Paste(text) => self.handle_paste(&text),
                    _ => {}
                }
            }

            // Small yield to allow other async tasks to run
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        Ok(())
    }

    fn start_audit(&mut self, input: String) {
        let course_ids = parser::parse_course_ids(&input);
        if course_ids.is_empty() {
            self.state = AppState::Input {
                input,
                message: Some("Please enter at least one valid course ID.".to_string()),
            };
            return;
        }

        tracing::info!(courses = course_ids.len(), "Starting audit");
        self.last_input = input;

        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let total = course_ids.len();

        let handle = tokio::spawn(async move {
            let callback = move |event: AuditProgress| {
                let _ = tx.send(event);
            };
            let progress: &ProgressCallback = &callback;
            fetcher::run_audit(&client, &course_ids, Some(progress)).await
        });

        self.running = Some(RunningAudit {
            handle,
            events: rx,
            started: Instant::now(),
        });
        self.state = AppState::Running {
            progress: FetchProgress::new(total),
        };
    }

    /// Applies pending progress events and collects the reports once the run ends.
    async fn pump_audit(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        while let Ok(event) = running.events.try_recv() {
            if let AppState::Running { progress } = &mut self.state {
                progress.apply(event);
            }
        }

        if !running.handle.is_finished() {
            return;
        }

        let Some(running) = self.running.take() else {
            return;
        };
        let elapsed = running.started.elapsed();

        self.state = match running.handle.await {
            Ok(reports) => {
                tracing::info!(
                    courses = reports.len(),
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Audit finished"
                );
                AppState::Results(ResultsView::new(reports, elapsed))
            }
            Err(e) => AppState::Error {
                message: format!("Audit task failed: {}", e),
            },
        };
    }

    fn handle_paste(&mut self, text: &str) {
        if let AppState::Input { input, message } = &mut self.state {
            input.push_str(text);
            *message = None;
        }
    }

    fn new_query(&mut self) {
        self.state = AppState::Input {
            input: self.last_input.clone(),
            message: None,
        };
    }

    /// Returns true when the user asked to quit.
    fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let current_state = std::mem::replace(
            &mut self.state,
            AppState::Input {
                input: String::new(),
                message: None,
            },
        );

        match current_state {
            AppState::Input { mut input, message } => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Char('q') if input.is_empty() => return true,
                KeyCode::Enter => self.start_audit(input),
                KeyCode::Char(c) => {
                    input.push(c);
                    self.state = AppState::Input {
                        input,
                        message: None,
                    };
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.state = AppState::Input { input, message };
                }
                _ => self.state = AppState::Input { input, message },
            },
            AppState::Running { progress } => match key.code {
                KeyCode::Char('q') => return true,
                _ => self.state = AppState::Running { progress },
            },
            AppState::Results(mut view) => {
                match key.code {
                    KeyCode::Char('q') => return true,
                    KeyCode::Enter | KeyCode::Esc => {
                        self.new_query();
                        return false;
                    }
                    KeyCode::Tab => view.next_course(),
                    KeyCode::BackTab => view.previous_course(),
                    KeyCode::Up => view.scroll_rows(-1),
                    KeyCode::Down => view.scroll_rows(1),
                    KeyCode::PageUp => view.scroll_rows(-10),
                    KeyCode::PageDown => view.scroll_rows(10),
                    KeyCode::Left => view.scroll_columns(-1),
                    KeyCode::Right => view.scroll_columns(1),
                    KeyCode::Char('j') => view.scroll_summary(1),
                    KeyCode::Char('k') => view.scroll_summary(-1),
                    KeyCode::Char('e') => {
                        view.notice = Some(match export::export_reports(&view.reports, Path::new(".")) {
                            Ok(paths) => format!(
                                "✓ Exported {} file(s): {}",
                                paths.len(),
                                paths
                                    .iter()
                                    .map(|p| p.display().to_string())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ),
                            Err(e) => {
                                tracing::warn!(error = %e, "CSV export failed");
                                format!("✗ Export failed: {:#}", e)
                            }
                        });
                    }
                    _ => {}
                }
                self.state = AppState::Results(view);
            }
            AppState::Error { message } => match key.code {
                KeyCode::Char('q') => return true,
                KeyCode::Enter | KeyCode::Esc => self.new_query(),
                _ => self.state = AppState::Error { message },
            },
        }

        false
    }
}
