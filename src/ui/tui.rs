//! Terminal renderer for the installation.
//!
//! The scene is projected through the camera and painted as Braille lines on
//! a ratatui canvas, with a one-line status footer and an optional parameter
//! panel on the right.

use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    text::{Line as TextLine, Span},
    widgets::{
        canvas::{Canvas, Line},
        Block, Borders, Paragraph,
    },
};
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

use crate::installation::{Control, Installation, Status};
use crate::scene::Segment;
use crate::sonify::Trigger;

const PANEL_WIDTH: u16 = 34;
const FOOTER_HEIGHT: u16 = 1;
const BACKGROUND: Color = Color::Rgb(0, 0, 0);
const FOOTER_FG: Color = Color::Rgb(185, 207, 212);

/// User input while the installation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationCommand {
    /// No key, or a key without a binding
    Continue,
    /// Escape, 'q' or Ctrl+C
    Quit,
    Control(Control),
}

/// Projected line ready for the canvas.
#[derive(Debug, Clone, Copy)]
struct ScreenLine {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    color: Color,
}

pub struct InstallationTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    last_frame: Instant,
    fps: f32,
}

impl InstallationTui {
    /// Creates the renderer and enters alternate screen mode.
    ///
    /// # Errors
    /// - If raw mode cannot be enabled
    /// - If alternate screen cannot be entered
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            last_frame: Instant::now(),
            fps: 0.0,
        })
    }

    /// Draws one frame of the installation.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn render(&mut self, installation: &Installation) -> anyhow::Result<()> {
        let elapsed = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();
        if elapsed > 0.0 {
            // Smoothed so the footer stays readable
            self.fps = self.fps * 0.9 + (1.0 / elapsed) * 0.1;
        }

        let status = installation.status();
        let segments = installation.segments();
        let fps = self.fps;

        self.terminal.draw(|frame| {
            let area = frame.area();

            let panel_width = if status.panel_enabled {
                PANEL_WIDTH.min(area.width / 2)
            } else {
                0
            };

            let scene_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width.saturating_sub(panel_width),
                height: area.height.saturating_sub(FOOTER_HEIGHT),
            };

            // Braille dots are two wide and four tall per cell, and cells are
            // roughly twice as tall as wide, so dots come out about square.
            let aspect = if scene_area.height == 0 {
                1.0
            } else {
                scene_area.width as f32 / (scene_area.height as f32 * 2.0)
            };
            let lines = project(&segments, &installation.projector(aspect));

            let canvas = Canvas::default()
                .background_color(BACKGROUND)
                .marker(Marker::Braille)
                .x_bounds([-1.0, 1.0])
                .y_bounds([-1.0, 1.0])
                .paint(|ctx| {
                    for line in &lines {
                        ctx.draw(&Line::new(line.x1, line.y1, line.x2, line.y2, line.color));
                    }
                });
            frame.render_widget(canvas, scene_area);

            if panel_width > 0 {
                let panel_area = Rect {
                    x: scene_area.x + scene_area.width,
                    y: area.y,
                    width: panel_width,
                    height: scene_area.height,
                };
                frame.render_widget(parameter_panel(&status), panel_area);
            }

            let footer_area = Rect {
                x: area.x,
                y: area.y + area.height.saturating_sub(FOOTER_HEIGHT),
                width: area.width,
                height: FOOTER_HEIGHT,
            };
            let footer = Paragraph::new(footer_line(&status, fps))
                .style(Style::default().fg(FOOTER_FG).bg(BACKGROUND));
            frame.render_widget(footer, footer_area);
        })?;

        Ok(())
    }

    /// Waits up to `timeout` for a key and maps it to a command.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<InstallationCommand> {
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let command = map_key(key.code, key.modifiers);
                if command != InstallationCommand::Continue {
                    tracing::debug!("Key {:?}: {:?}", key.code, command);
                }
                return Ok(command);
            }
        }
        Ok(InstallationCommand::Continue)
    }

    /// Leaves alternate screen mode and restores the terminal.
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

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> InstallationCommand {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            InstallationCommand::Quit
        }
        KeyCode::Char('q') | KeyCode::Esc => InstallationCommand::Quit,
        KeyCode::Char('b') => InstallationCommand::Control(Control::ToggleBox),
        KeyCode::Char('g') => InstallationCommand::Control(Control::TogglePanel),
        KeyCode::Char('t') => InstallationCommand::Control(Control::TestTone),
        KeyCode::Char('[') => InstallationCommand::Control(Control::ThresholdDown),
        KeyCode::Char(']') => InstallationCommand::Control(Control::ThresholdUp),
        _ => InstallationCommand::Continue,
    }
}

/// Projects every segment, dropping the ones with an end behind the eye.
fn project(segments: &[Segment], projector: &crate::scene::Projector) -> Vec<ScreenLine> {
    segments
        .iter()
        .filter(|segment| segment.shade.alpha > 0.0)
        .filter_map(|segment| {
            let (x1, y1) = projector.project(segment.from)?;
            let (x2, y2) = projector.project(segment.to)?;
            let (r, g, b) = segment.shade.over_black();
            Some(ScreenLine {
                x1,
                y1,
                x2,
                y2,
                color: Color::Rgb(r, g, b),
            })
        })
        .collect()
}

fn footer_line(status: &Status, fps: f32) -> TextLine<'static> {
    let indicator = match status.trigger {
        Trigger::Enter => Span::styled("● ", Style::default().fg(Color::Rgb(153, 230, 230))),
        Trigger::Exit => Span::styled("○ ", Style::default().fg(Color::DarkGray)),
        Trigger::Stay if status.gains.sum > status.enter_threshold => {
            Span::styled("● ", Style::default().fg(Color::Rgb(153, 230, 230)))
        }
        Trigger::Stay => Span::styled("○ ", Style::default().fg(Color::DarkGray)),
    };

    TextLine::from(vec![
        indicator,
        Span::raw(format!("{fps:>4.0} fps")),
        Span::raw(" / "),
        Span::raw(format!("gain {:.2}", status.gains.average)),
        Span::raw(" / "),
        Span::raw(format!("{:.0} mm", status.distance_threshold_mm)),
        Span::raw(" / "),
        Span::raw(status.source.clone()),
    ])
}

fn parameter_panel(status: &Status) -> Paragraph<'static> {
    let (eye, target) = status.camera;
    let label = Style::default().fg(Color::DarkGray);
    let row = |name: &str, value: String| {
        TextLine::from(vec![
            Span::styled(format!("{name:<12}"), label),
            Span::raw(value),
        ])
    };

    let lines = vec![
        row("trigger", status.trigger.to_string()),
        row("gain sum", format!("{:.2}", status.gains.sum)),
        row("gain avg", format!("{:.3}", status.gains.average)),
        row("enter at", format!("{:.2}", status.enter_threshold)),
        row("distance", format!("{:.0} mm", status.distance_threshold_mm)),
        row("write head", format!("{}/{}", status.write_head, status.time_slices)),
        row("past peak", format!("{:.2}", status.past_peak)),
        row("contour", format!("{:.2}", status.contour_peak)),
        row(
            "scanner",
            format!("{:>3.0}° fill {}", status.scanner_angle.to_degrees(), status.scanner_fill),
        ),
        row("eye", format!("{:.2} {:.2} {:.2}", eye.x, eye.y, eye.z)),
        row("look at", format!("{:.2} {:.2} {:.2}", target.x, target.y, target.z)),
        row("box", if status.box_enabled { "on" } else { "off" }.to_string()),
        TextLine::raw(""),
        TextLine::styled("b box  t tone  [ ] distance", label),
        TextLine::styled("g panel  q quit", label),
    ];

    Paragraph::new(lines)
        .style(Style::default().fg(FOOTER_FG).bg(BACKGROUND))
        .block(Block::default().borders(Borders::LEFT).title(" parameters "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Shade, WHITE};

    #[test]
    fn test_key_bindings() {
        assert_eq!(map_key(KeyCode::Char('q'), KeyModifiers::NONE), InstallationCommand::Quit);
        assert_eq!(map_key(KeyCode::Esc, KeyModifiers::NONE), InstallationCommand::Quit);
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            InstallationCommand::Quit
        );
        assert_eq!(
            map_key(KeyCode::Char('b'), KeyModifiers::NONE),
            InstallationCommand::Control(Control::ToggleBox)
        );
        assert_eq!(
            map_key(KeyCode::Char(']'), KeyModifiers::NONE),
            InstallationCommand::Control(Control::ThresholdUp)
        );
        assert_eq!(
            map_key(KeyCode::Char('g'), KeyModifiers::NONE),
            InstallationCommand::Control(Control::TogglePanel)
        );
        assert_eq!(map_key(KeyCode::Char('x'), KeyModifiers::NONE), InstallationCommand::Continue);
    }

    #[test]
    fn test_projection_drops_invisible_segments() {
        let mut camera = crate::scene::OrbitCamera::new(&crate::config::CameraConfig::default());
        camera.set_manual(Some((
            cgmath::Point3::new(0.0, 0.0, -4.0),
            cgmath::Point3::new(0.0, 0.0, 0.0),
        )));
        let projector = camera.projector(1.0);

        let segments = [
            Segment::new([0.0, 0.0, 0.0], [0.5, 0.0, 0.0], Shade::new(WHITE, 1.0)),
            Segment::new([0.0, 0.0, 0.0], [0.5, 0.0, 0.0], Shade::new(WHITE, 0.0)),
            Segment::new([0.0, 0.0, 0.0], [0.0, 0.0, -9.0], Shade::new(WHITE, 1.0)),
        ];
        let lines = project(&segments, &projector);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].color, Color::Rgb(255, 255, 255));
    }
}
