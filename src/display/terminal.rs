//! Full-screen terminal dashboard (crossterm).
//! Raw mode swallows SIGINT, so `q` and Ctrl+C are read as keys and stop the loop.

use std::io::{Stdout, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use tracing::warn;

use super::colors::{fan_band, temperature_band};
use super::{format_optional, DashboardView, Presenter};
use crate::control::readiness::WaitReason;
use crate::control::types::ControlSnapshot;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const MIN_WIDTH: u16 = 90;
const FAN_COLUMN: u16 = 60;
const SEPARATOR_COLUMN: u16 = 58;
const LINE_WIDTH: usize = 54;

pub struct TerminalPresenter {
    out: Stdout,
    spinner_idx: usize,
}

impl TerminalPresenter {
    pub fn new() -> Result<Self> {
        let mut out = std::io::stdout();
        terminal::enable_raw_mode().context("Failed to enable raw terminal mode")?;
        execute!(out, EnterAlternateScreen, Hide).context("Failed to enter alternate screen")?;
        Ok(Self { out, spinner_idx: 0 })
    }

    fn next_spinner(&mut self) -> &'static str {
        self.spinner_idx = (self.spinner_idx + 1) % SPINNER.len();
        SPINNER[self.spinner_idx]
    }

    fn headline(&mut self, snapshot: &ControlSnapshot) -> Result<()> {
        let board = snapshot.highest_board_temp;
        let gpu = snapshot.gpu_temp.map(|t| t as f64);

        queue!(
            self.out,
            MoveTo(0, 0),
            SetForegroundColor(temperature_band(board).color()),
            Print(format!(
                "Highest Temperature for Board or CPUs: {} ",
                format_optional(board, "C")
            )),
            MoveTo(FAN_COLUMN, 0),
            SetForegroundColor(fan_band(Some(snapshot.mean_fan_speed as f64)).color()),
            Print(format!("Mean Fan Speed: {} RPM ", snapshot.mean_fan_speed)),
            MoveTo(MIN_WIDTH, 0),
            SetForegroundColor(temperature_band(gpu).color()),
            Print(format!("GPU Temperature: {}", format_optional(snapshot.gpu_temp, "C"))),
            ResetColor
        )?;
        Ok(())
    }
}

impl Presenter for TerminalPresenter {
    fn render(&mut self, view: &DashboardView) -> Result<()> {
        let (width, _) = terminal::size()?;
        queue!(self.out, Clear(ClearType::All))?;

        if width < MIN_WIDTH {
            queue!(
                self.out,
                MoveTo(0, 0),
                SetForegroundColor(Color::Magenta),
                Print("Terminal too small!"),
                ResetColor
            )?;
            self.out.flush()?;
            return Ok(());
        }

        self.headline(&view.snapshot)?;

        let rows = view.temp_lines.len().max(view.fan_lines.len());
        for i in 0..rows {
            queue!(
                self.out,
                MoveTo(SEPARATOR_COLUMN, i as u16 + 2),
                SetForegroundColor(Color::Green),
                Print("|"),
                ResetColor
            )?;
        }
        for (i, line) in view.temp_lines.iter().enumerate() {
            queue!(self.out, MoveTo(0, i as u16 + 2), Print(format!("{:<width$.width$}", line, width = LINE_WIDTH)))?;
        }
        for (i, line) in view.fan_lines.iter().enumerate() {
            queue!(self.out, MoveTo(FAN_COLUMN, i as u16 + 2), Print(format!("{:<width$.width$}", line, width = LINE_WIDTH)))?;
        }

        let spinner = self.next_spinner();
        queue!(
            self.out,
            MoveTo(0, view.temp_lines.len() as u16 + 4),
            SetForegroundColor(Color::Yellow),
            Print(format!("Running {}  -> {} (max {}C)", spinner, view.level, view.max_temp)),
            ResetColor
        )?;

        self.out.flush()?;
        Ok(())
    }

    fn waiting(&mut self, snapshot: &ControlSnapshot, reasons: &[WaitReason], delay: Duration) -> Result<()> {
        queue!(self.out, Clear(ClearType::All))?;
        self.headline(snapshot)?;

        for (i, reason) in reasons.iter().enumerate() {
            queue!(
                self.out,
                MoveTo(0, i as u16 + 2),
                SetForegroundColor(Color::Red),
                Print(format!("{}, waiting {}s...", reason, delay.as_secs_f64())),
                ResetColor
            )?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    warn!("Terminal event poll failed: {}", e);
                    return false;
                }
            }

            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
                    if key.code == KeyCode::Char('q') || ctrl_c {
                        return true;
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Terminal event read failed: {}", e);
                    return false;
                }
            }
        }
    }
}

impl Drop for TerminalPresenter {
    fn drop(&mut self) {
        let _ = execute!(self.out, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
