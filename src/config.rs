pub const SIM_HZ: f32 = 60.0;
pub const RENDER_HZ: f32 = 30.0;
pub const STEP_INTERVAL: f32 = 1.0 / SIM_HZ;

pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 800.0;

pub const GRAVITY_G: f32 = 0.01;

pub const SPAWN_MASS: f32 = 1.0;
pub const SPAWN_RADIUS: f32 = 5.0;
pub const DRAG_VEL_DIVISOR: f32 = 10.0;

pub const SCATTER_COUNT: usize = 8;
pub const SCATTER_MASS_MIN: f32 = 1.0;
pub const SCATTER_MASS_MAX: f32 = 60.0;
pub const SCATTER_SPEED_MAX: f32 = 2.0;

pub const SCATTER_RADIUS_BASE: f32 = 3.0;
pub const SCATTER_RADIUS_SCALE: f32 = 0.15;

pub const FAST_SPEED: f32 = 8.0;
pub const HEAVY_MASS: f32 = 40.0;
pub const MID_MASS: f32 = 10.0;
