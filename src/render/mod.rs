use crate::{
    config,
    types::{BodySnapshot, ColorId, Vec2, TRAIL_LEN},
};

#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec2,
    pub zoom: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::new(config::CANVAS_WIDTH / 2.0, config::CANVAS_HEIGHT / 2.0),
            zoom: 1.0,
        }
    }
}

impl Camera {
    /// Camera centered on the canvas, zoomed so the whole 800x800 world
    /// fits the viewport.
    pub fn fit(viewport: Viewport) -> Self {
        let zoom_x = viewport.width as f32 / config::CANVAS_WIDTH;
        let zoom_y = viewport.height as f32 / config::CANVAS_HEIGHT;
        Self {
            pos: Vec2::new(config::CANVAS_WIDTH / 2.0, config::CANVAS_HEIGHT / 2.0),
            zoom: zoom_x.min(zoom_y).max(1e-6),
        }
    }

    pub fn world_to_screen(&self, pos: Vec2, viewport: Viewport) -> (i32, i32) {
        let half_w = viewport.width as f32 / 2.0;
        let half_h = viewport.height as f32 / 2.0;
        (
            ((pos.x - self.pos.x) * self.zoom + half_w).round() as i32,
            ((pos.y - self.pos.y) * self.zoom + half_h).round() as i32,
        )
    }

    pub fn screen_to_world(&self, x: f32, y: f32, viewport: Viewport) -> Vec2 {
        let half_w = viewport.width as f32 / 2.0;
        let half_h = viewport.height as f32 / 2.0;
        Vec2::new(
            (x - half_w) / self.zoom + self.pos.x,
            (y - half_h) / self.zoom + self.pos.y,
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Copy, Debug)]
pub struct DragLine {
    pub anchor: Vec2,
    pub pointer: Vec2,
}

#[derive(Clone, Copy, Debug)]
pub struct RenderCell {
    pub ch: char,
    pub weight: f32,
    pub color: ColorId,
}

#[derive(Debug)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<RenderCell>,
}

impl FrameBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let mut buffer = Self {
            width,
            height,
            cells: Vec::new(),
        };
        buffer.resize(width, height);
        buffer
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let len = (width as usize).saturating_mul(height as usize);
        if self.cells.len() != len {
            self.cells.resize(
                len,
                RenderCell {
                    ch: ' ',
                    weight: f32::NEG_INFINITY,
                    color: ColorId::White,
                },
            );
        }
        self.clear();
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.ch = ' ';
            cell.weight = f32::NEG_INFINITY;
            cell.color = ColorId::White;
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn get(&self, x: u16, y: u16) -> RenderCell {
        debug_assert!(x < self.width && y < self.height, "get() out of bounds");
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        self.cells[idx]
    }

    // Weight-priority write: the heaviest thing on a cell owns its glyph.
    fn set(&mut self, x: u16, y: u16, ch: char, weight: f32, color: ColorId) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        let cell = &mut self.cells[idx];
        if weight >= cell.weight {
            cell.weight = weight;
            cell.ch = ch;
            cell.color = color;
        }
    }
}

pub fn draw(
    snapshot: &[BodySnapshot],
    drag: Option<DragLine>,
    camera: &Camera,
    viewport: Viewport,
    frame: &mut FrameBuffer,
) {
    if frame.width() != viewport.width || frame.height() != viewport.height {
        frame.resize(viewport.width, viewport.height);
    } else {
        frame.clear();
    }

    for body in snapshot {
        draw_trail(body, camera, viewport, frame);
    }

    for body in snapshot {
        draw_body(body, camera, viewport, frame);
    }

    if let Some(line) = drag {
        draw_drag_line(&line, camera, viewport, frame);
    }
}

fn draw_body(body: &BodySnapshot, camera: &Camera, viewport: Viewport, frame: &mut FrameBuffer) {
    let (sx, sy) = camera.world_to_screen(body.pos, viewport);
    let color = body_color(body);

    // The radius field is the drawn diameter, matching how the spawn
    // constant was always tuned.
    let screen_r = body.radius * camera.zoom * 0.5;
    let reach = screen_r.floor() as i32;
    for dy in -reach..=reach {
        for dx in -reach..=reach {
            if (dx * dx + dy * dy) as f32 > screen_r * screen_r {
                continue;
            }
            let x = sx + dx;
            let y = sy + dy;
            if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
                continue;
            }
            frame.set(x as u16, y as u16, 'o', body.mass, color);
        }
    }

    if sx >= 0 && sy >= 0 && sx < viewport.width as i32 && sy < viewport.height as i32 {
        frame.set(sx as u16, sy as u16, '@', body.mass, color);
    }
}

fn draw_trail(body: &BodySnapshot, camera: &Camera, viewport: Viewport, frame: &mut FrameBuffer) {
    if body.trail_len == 0 {
        return;
    }
    let max_len = body.trail_len.min(TRAIL_LEN);
    for i in 0..max_len {
        // Ring buffer walked newest to oldest
        let idx = (body.trail_head + TRAIL_LEN - i) % TRAIL_LEN;
        let pos = body.trail[idx];
        let (sx, sy) = camera.world_to_screen(pos, viewport);
        if sx < 0 || sy < 0 || sx >= viewport.width as i32 || sy >= viewport.height as i32 {
            continue;
        }
        let age = i as f32 / max_len as f32;
        let ch = if age < 0.4 { '·' } else { '.' };
        let weight = body.mass * (0.3 * (1.0 - age));
        frame.set(sx as u16, sy as u16, ch, weight, ColorId::Trail);
    }
}

fn draw_drag_line(line: &DragLine, camera: &Camera, viewport: Viewport, frame: &mut FrameBuffer) {
    let (x0, y0) = camera.world_to_screen(line.anchor, viewport);
    let (x1, y1) = camera.world_to_screen(line.pointer, viewport);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()).max(1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = (x0 as f32 + (x1 - x0) as f32 * t).round() as i32;
        let y = (y0 as f32 + (y1 - y0) as f32 * t).round() as i32;
        if x < 0 || y < 0 || x >= viewport.width as i32 || y >= viewport.height as i32 {
            continue;
        }
        // Drawn above everything else
        frame.set(x as u16, y as u16, '*', 1.0e9, ColorId::Line);
    }
}

fn body_color(body: &BodySnapshot) -> ColorId {
    let speed = body.vel.length();
    if speed > config::FAST_SPEED {
        ColorId::Cyan
    } else if body.mass >= config::HEAVY_MASS {
        ColorId::Yellow
    } else if body.mass >= config::MID_MASS {
        ColorId::Magenta
    } else {
        ColorId::White
    }
}
