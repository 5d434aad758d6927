use std::{error::Error, io, time::Duration};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

use crate::{
    config,
    core::World,
    render,
    types::{BodySnapshot, ColorId, Vec2},
};

pub fn run() -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut world = World::new();
    let mut snapshot: Vec<BodySnapshot> = Vec::new();
    let mut ui_state = UiState::new();

    let mut accumulator = 0.0_f32;
    let mut last_tick = std::time::Instant::now();
    let mut last_render = std::time::Instant::now();
    let render_interval = Duration::from_secs_f32(1.0 / config::RENDER_HZ);
    let mut sim_counter = 0_u32;
    let mut render_counter = 0_u32;
    let mut last_fps_sample = std::time::Instant::now();
    let mut sim_fps = 0.0_f32;
    let mut render_fps = 0.0_f32;

    loop {
        let now = std::time::Instant::now();
        let dt = (now - last_tick).as_secs_f32();
        last_tick = now;
        accumulator += dt;

        // The step itself is a unit timestep; the accumulator only decides
        // how many of them run this iteration.
        while accumulator >= config::STEP_INTERVAL {
            world.step();
            accumulator -= config::STEP_INTERVAL;
            sim_counter += 1;
        }

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                CrosstermEvent::Key(key) => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        shutdown_terminal(&mut terminal)?;
                        return Ok(());
                    }
                    KeyCode::Char('r') => {
                        world.scatter(config::SCATTER_COUNT);
                    }
                    _ => {}
                },
                CrosstermEvent::Mouse(mouse) => {
                    handle_mouse(mouse, &mut world, &mut ui_state);
                }
                _ => {}
            }
        }

        if last_render.elapsed() >= render_interval {
            world.snapshot(&mut snapshot);
            let stats = world.stats();
            let drag = world.drag_gesture().map(|gesture| render::DragLine {
                anchor: gesture.anchor,
                pointer: ui_state.pointer.unwrap_or(gesture.anchor),
            });
            if last_fps_sample.elapsed() >= Duration::from_secs(1) {
                let secs = last_fps_sample.elapsed().as_secs_f32();
                sim_fps = sim_counter as f32 / secs;
                render_fps = render_counter as f32 / secs;
                sim_counter = 0;
                render_counter = 0;
                last_fps_sample = std::time::Instant::now();
            }
            terminal.draw(|frame| {
                let size = frame.size();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Min(3),
                        Constraint::Length(3),
                    ])
                    .split(size);

                let header = Paragraph::new(format!(
                    "bodies: {} | mass: {:.1} | momentum: ({:.2}, {:.2}) | top speed: {:.1} | sim fps: {:.1} | render fps: {:.1}",
                    stats.body_count,
                    stats.total_mass,
                    stats.momentum.x,
                    stats.momentum.y,
                    stats.max_speed,
                    sim_fps,
                    render_fps
                ))
                .block(Block::default().borders(Borders::ALL).title("gravtoy"));
                frame.render_widget(header, chunks[0]);

                let inner = chunks[1].inner(&Margin {
                    horizontal: 1,
                    vertical: 1,
                });
                ui_state.ensure_viewport(inner);
                let viewport = render::Viewport {
                    width: inner.width,
                    height: inner.height,
                };
                ui_state.camera = render::Camera::fit(viewport);
                render::draw(
                    &snapshot,
                    drag,
                    &ui_state.camera,
                    viewport,
                    &mut ui_state.framebuf,
                );

                let framebuf = &ui_state.framebuf;
                let width = framebuf.width();
                let height = framebuf.height();
                {
                    let lines_store = &mut ui_state.lines;
                    for y in 0..height {
                        let line = &mut lines_store[y as usize];
                        line.clear();
                        line.reserve(width as usize);
                        for x in 0..width {
                            let cell = framebuf.get(x, y);
                            line.push(cell.ch);
                        }
                    }
                }
                let lines: Vec<Line> = ui_state
                    .lines
                    .iter()
                    .enumerate()
                    .map(|(y, line)| {
                        let mut spans: Vec<Span> = Vec::with_capacity(line.len());
                        for (x, ch) in line.chars().enumerate() {
                            let cell = framebuf.get(x as u16, y as u16);
                            let color = color_for(cell.color);
                            spans.push(Span::styled(ch.to_string(), Style::default().fg(color)));
                        }
                        Line::from(spans)
                    })
                    .collect();

                let canvas = Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL).title("Canvas"));
                frame.render_widget(canvas, chunks[1]);

                let footer = Paragraph::new(
                    "drag: launch a body | r: scatter | q: quit",
                )
                .block(Block::default().borders(Borders::ALL).title("Controls"));
                frame.render_widget(footer, chunks[2]);
            })?;

            last_render = std::time::Instant::now();
            render_counter += 1;
        }

        std::thread::sleep(Duration::from_millis(1));
    }
}

fn handle_mouse(mouse: MouseEvent, world: &mut World, ui_state: &mut UiState) {
    // Before the first draw there is no canvas to map into.
    if ui_state.canvas_area.width == 0 || ui_state.canvas_area.height == 0 {
        return;
    }
    let pointer = ui_state.pointer_to_world(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            ui_state.pointer = Some(pointer);
            world.begin_drag(pointer);
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            ui_state.pointer = Some(pointer);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            ui_state.pointer = Some(pointer);
            world.end_drag(pointer);
        }
        _ => {}
    }
}

fn shutdown_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

struct UiState {
    camera: render::Camera,
    framebuf: render::FrameBuffer,
    lines: Vec<String>,
    pointer: Option<Vec2>,
    canvas_area: Rect,
}

impl UiState {
    fn new() -> Self {
        Self {
            camera: render::Camera::default(),
            framebuf: render::FrameBuffer::new(0, 0),
            lines: Vec::new(),
            pointer: None,
            canvas_area: Rect::default(),
        }
    }

    fn ensure_viewport(&mut self, area: Rect) {
        self.canvas_area = area;
        if self.framebuf.width() != area.width || self.framebuf.height() != area.height {
            self.framebuf.resize(area.width, area.height);
        }
        let desired = area.height as usize;
        if self.lines.len() != desired {
            self.lines.clear();
            self.lines.resize_with(desired, String::new);
        }
    }

    fn pointer_to_world(&self, column: u16, row: u16) -> Vec2 {
        let area = self.canvas_area;
        // Events arrive in terminal coordinates; clamp into the canvas so a
        // release just outside the border still completes the gesture.
        let col = column
            .max(area.x)
            .min(area.x + area.width.saturating_sub(1));
        let row = row
            .max(area.y)
            .min(area.y + area.height.saturating_sub(1));
        let local_x = (col - area.x) as f32;
        let local_y = (row - area.y) as f32;
        self.camera.screen_to_world(
            local_x,
            local_y,
            render::Viewport {
                width: area.width,
                height: area.height,
            },
        )
    }
}

fn color_for(color: ColorId) -> Color {
    match color {
        ColorId::White => Color::White,
        ColorId::Cyan => Color::Cyan,
        ColorId::Yellow => Color::Yellow,
        ColorId::Magenta => Color::Magenta,
        ColorId::Trail => Color::DarkGray,
        ColorId::Line => Color::White,
    }
}
