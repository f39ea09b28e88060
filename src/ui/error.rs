//! Full-screen error display shown before the installation gives up.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const ERROR_BG: Color = Color::Rgb(120, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Red screen with a centred title and message.
///
/// Stays up until any key is pressed.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(ErrorScreen { terminal })
    }

    /// Shows `title` and `message` until a key is pressed.
    ///
    /// The message wraps to 80% of the screen width.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, title: &str, message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                frame.buffer_mut().set_style(area, Style::default().bg(ERROR_BG));

                let mut lines = vec![
                    Line::styled(title, Style::default().fg(ERROR_FG).bold()),
                    Line::raw(""),
                ];
                lines.extend(message.lines().map(Line::raw));
                lines.push(Line::raw(""));
                lines.push(Line::styled(
                    "press any key",
                    Style::default().fg(Color::Rgb(255, 170, 170)),
                ));

                let height = (lines.len() as u16 + 2).min(area.height);
                let text_area = Rect {
                    x: area.x + area.width / 10,
                    y: area.y + area.height.saturating_sub(height) / 2,
                    width: area.width * 8 / 10,
                    height,
                };

                let paragraph = Paragraph::new(lines)
                    .style(Style::default().fg(ERROR_FG).bg(ERROR_BG))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true });
                frame.render_widget(paragraph, text_area);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Leaves alternate screen mode.
    ///
    /// # Errors
    /// - If terminal mode cannot be disabled
    /// - If cursor cannot be shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

/// Shows an error screen and restores the terminal afterwards.
///
/// # Errors
/// - If the terminal cannot be driven
pub fn report(title: &str, message: &str) -> anyhow::Result<()> {
    let mut screen = ErrorScreen::new()?;
    screen.show_error(title, message)?;
    screen.cleanup()
}
