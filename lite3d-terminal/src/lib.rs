/// Terminal front-end for the lite3d pipeline
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use lite3d_core::config::AXIS_WEIGHT_LIMIT;
use lite3d_core::{Command, MeshLibrary, MeshSource, RenderError, Renderer, RendererConfig};
use std::f64::consts::PI;
use std::io::{self, stdout, Write};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

pub mod renderer;

pub use renderer::AsciiRenderer;

/// Camera-space extent that should fit the shorter side of the terminal.
const VIEW_EXTENT: f64 = 40.0;
/// Axis tilt per arrow key press.
const AXIS_STEP: f64 = PI / 12.0;

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    renderer: Renderer<MeshLibrary>,
    commands: Sender<Command>,
    painter: AsciiRenderer,
    running: bool,
    last_tick: Instant,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

/// Spacing that fits [`VIEW_EXTENT`] onto a `columns × 2·rows` surface.
pub fn spacing_for(columns: u16, rows: u16) -> f64 {
    let shorter = f64::from(columns).min(f64::from(rows) * 2.0).max(1.0);
    shorter / VIEW_EXTENT
}

impl TerminalApp {
    /// Build the app for the current terminal size. The surface and spacing
    /// in `config` are replaced by the terminal's own.
    pub fn new(library: MeshLibrary, mut config: RendererConfig) -> io::Result<Self> {
        let (columns, rows) = terminal::size()?;
        let painter = AsciiRenderer::new(columns as usize, rows as usize);
        let (width, height) = painter.surface_size();
        config.surface_width = width;
        config.surface_height = height;
        config.spacing_unit = spacing_for(columns, rows);

        let renderer = Renderer::new(library, config).map_err(to_io)?;
        log::info!(
            "terminal {}x{}, models: {}",
            columns,
            rows,
            renderer.model_names().join(", ")
        );

        Ok(Self {
            commands: renderer.commands(),
            renderer,
            painter,
            running: true,
            last_tick: Instant::now(),
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            event::EnableFocusChange
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            event::DisableFocusChange,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            // Update
            let now = Instant::now();
            let elapsed = now - self.last_tick;
            self.last_tick = now;
            if let Err(e) = self.renderer.tick(elapsed) {
                log::warn!("{e}");
            }

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => {
                if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
                    self.running = false;
                    return;
                }
                let names = self.renderer.model_names();
                let weights = self.renderer.rotation().weights();
                let speed = self.renderer.rotation().speed();
                if let Some(command) = key_command(code, &names, weights, speed) {
                    self.send(command);
                }
            }
            Event::Resize(columns, rows) => {
                self.painter.resize(columns as usize, rows as usize);
                let (width, height) = self.painter.surface_size();
                self.send(Command::Resize { width, height });
            }
            Event::FocusGained => self.send(Command::SetVisible(true)),
            Event::FocusLost => self.send(Command::SetVisible(false)),
            _ => {}
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            log::error!("renderer command queue closed");
        }
    }

    fn render(&mut self) -> io::Result<()> {
        self.painter.clear();
        self.painter.paint(self.renderer.frame());

        // Output to terminal
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.painter.draw(&mut stdout)?;

        // Draw UI overlay
        let style = self.renderer.style();
        let model = self.renderer.model().map_or("-", |m| m.name());
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "lite3d | {} | {}/{} | speed {:.0}{} | FPS: {:.1} | 1-0=Model F/V=Style S=Step R=Reset Space=Pause Q=Quit",
                model,
                style.fill,
                style.view,
                self.renderer.rotation().speed(),
                if self.renderer.is_paused() { " (paused)" } else { "" },
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Translate a key press into a renderer command.
///
/// `names` is the model list in selection order; `weights` and `speed` are
/// the current rotation settings that the arrow keys adjust.
pub fn key_command(
    code: KeyCode,
    names: &[String],
    weights: [f64; 3],
    speed: f64,
) -> Option<Command> {
    let command = match code {
        KeyCode::Char(c @ '0'..='9') => {
            let slot = match c.to_digit(10)? {
                0 => 9,
                n => n as usize - 1,
            };
            Command::SelectModel(names.get(slot)?.clone())
        }
        KeyCode::Char('f') => Command::CycleFill,
        KeyCode::Char('v') => Command::CycleView,
        KeyCode::Char('s') => Command::StepFrame,
        KeyCode::Char('r') => Command::ResetModel,
        KeyCode::Char('c') => Command::CenterModel,
        KeyCode::Char(' ') | KeyCode::Char('`') => Command::TogglePause,
        KeyCode::Char('+') | KeyCode::Char('=') => Command::Zoom(1.0),
        KeyCode::Char('-') => Command::Zoom(-1.0),
        KeyCode::Up => Command::SetRotationSpeed(speed + 1.0),
        KeyCode::Down => Command::SetRotationSpeed(speed - 1.0),
        KeyCode::Left => Command::SetRotationAxis(tilt_axis(weights, -AXIS_STEP)),
        KeyCode::Right => Command::SetRotationAxis(tilt_axis(weights, AXIS_STEP)),
        _ => return None,
    };
    Some(command)
}

/// Turn the axis weights about the vertical axis, scaling them back down
/// when a component would leave the ±100 weight range.
pub fn tilt_axis([x, y, z]: [f64; 3], angle: f64) -> [f64; 3] {
    let (sin, cos) = angle.sin_cos();
    let turned = [x * cos + z * sin, y, -x * sin + z * cos];
    let largest = turned.iter().fold(0.0_f64, |m, w| m.max(w.abs()));
    if largest > AXIS_WEIGHT_LIMIT {
        turned.map(|w| w * AXIS_WEIGHT_LIMIT / largest)
    } else {
        turned
    }
}

/// Report a pipeline error through `io::Error`.
pub fn to_io(e: RenderError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}

/// List the models a library offers, one per line, with their selection key.
pub fn describe_models<S: MeshSource>(source: &S) -> String {
    source
        .names()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let key = match i {
                0..=8 => (i + 1).to_string(),
                9 => "0".to_string(),
                _ => "-".to_string(),
            };
            let detail = source
                .mesh(name)
                .map(|m| format!("{} vertices, {} faces", m.vertices.len(), m.faces.len()))
                .unwrap_or_default();
            format!("[{key}] {name}: {detail}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
