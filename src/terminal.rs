// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based depth mapping viewer
//!
//! Renders the point cloud or registered image to the terminal using Unicode
//! half-block characters for improved vertical resolution.

use crate::app::{App, create_device};
use crate::config::Config;
use crate::constants::camera::{DRAG_SENSITIVITY, ZOOM_STEP};
use crate::constants::keys;
use crate::constants::timing::INPUT_POLL;
use crate::render::Canvas;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, stdout};
use tracing::info;

const STATUS_MESSAGE: &str =
    "1-5 mode | arrows/drag orbit | +/- or scroll zoom | 'r' reset view | 'q' quit";

/// Run the terminal viewer
pub fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    // Open the sensor before touching the terminal so errors print normally
    let device = create_device(config)?;
    let mut app = App::new(device, config);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!(frames = app.frames_mapped(), "Viewer closed");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut canvas = Canvas::new(0, 0);
    let mut drag_from: Option<(u16, u16)> = None;

    loop {
        app.update()?;

        // Draw
        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let view_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };

            // Each terminal cell shows two canvas rows
            canvas.resize(
                view_area.width as u32,
                view_area.height as u32 * 2,
                image::Rgba([0, 0, 0, 255]),
            );
            app.draw(&mut canvas);
            f.render_widget(CanvasWidget { canvas: &canvas }, view_area);
            f.render_widget(
                Overlay {
                    lines: &app.overlay_lines(),
                },
                view_area,
            );

            // Render status bar
            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            f.render_widget(
                StatusBar {
                    message: STATUS_MESSAGE,
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if !event::poll(INPUT_POLL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    break;
                }

                match key.code {
                    KeyCode::Char(keys::QUIT) => break,
                    KeyCode::Char(c) => {
                        app.handle_key(c);
                    }
                    KeyCode::Left => app.orbit_steps(-1.0, 0.0),
                    KeyCode::Right => app.orbit_steps(1.0, 0.0),
                    KeyCode::Up => app.orbit_steps(0.0, 1.0),
                    KeyCode::Down => app.orbit_steps(0.0, -1.0),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    drag_from = Some((mouse.column, mouse.row));
                }
                MouseEventKind::Drag(MouseButton::Left) => {
                    if let Some((column, row)) = drag_from {
                        let dx = mouse.column as f32 - column as f32;
                        // Rows are two canvas pixels tall
                        let dy = (mouse.row as f32 - row as f32) * 2.0;
                        app.orbit(-dx * DRAG_SENSITIVITY, dy * DRAG_SENSITIVITY);
                    }
                    drag_from = Some((mouse.column, mouse.row));
                }
                MouseEventKind::Up(MouseButton::Left) => drag_from = None,
                MouseEventKind::ScrollUp => app.zoom(ZOOM_STEP),
                MouseEventKind::ScrollDown => app.zoom(1.0 / ZOOM_STEP),
                _ => {}
            },
            _ => {}
        }
    }

    Ok(())
}

/// Widget that renders a canvas using half-block characters
struct CanvasWidget<'a> {
    canvas: &'a Canvas,
}

impl Widget for CanvasWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let pixels = self.canvas.pixels();
        let (width, height) = pixels.dimensions();

        // Each terminal cell represents 2 vertical pixels:
        // - Upper half (▀) colored with fg
        // - Lower half colored with bg
        for ty in 0..area.height {
            for tx in 0..area.width {
                let (x, y_top) = (tx as u32, ty as u32 * 2);
                if x >= width || y_top + 1 >= height {
                    continue;
                }
                let top = pixels.get_pixel(x, y_top);
                let bottom = pixels.get_pixel(x, y_top + 1);

                if let Some(cell) = buf.cell_mut((area.x + tx, area.y + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(Color::Rgb(top[0], top[1], top[2]));
                    cell.set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}

/// Frame rate and mode readout in the top-left corner
struct Overlay<'a> {
    lines: &'a [String],
}

impl Widget for Overlay<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::Black);
        for (i, line) in self.lines.iter().enumerate() {
            let y = area.y + i as u16;
            if y >= area.y + area.height {
                break;
            }
            buf.set_stringn(area.x, y, line, area.width as usize, style);
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
