use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config,
    types::{Body, BodySnapshot, DragGesture, Vec2, WorldStats, TRAIL_LEN},
};

pub struct World {
    pub bodies: Vec<Body>,
    drag: Option<DragGesture>,
    rng: StdRng,
    positions: Vec<Vec2>,
}

impl World {
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            drag: None,
            rng: StdRng::from_entropy(),
            positions: Vec::new(),
        }
    }

    /// Advance the simulation by one frame unit. Forces read the positions
    /// captured at the start of the step, so the pair loop never sees
    /// half-updated state.
    pub fn step(&mut self) {
        let n = self.bodies.len();
        self.positions.clear();
        self.positions.extend(self.bodies.iter().map(|b| b.pos));

        // Every ordered pair is visited, so each unordered pair contributes
        // twice. That matches the accumulation order this toy has always had;
        // collapsing it to one visit per pair changes the rounding path.
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let d = self.positions[i].distance(self.positions[j]);
                if d == 0.0 {
                    // Coincident bodies: skip the pair rather than let a
                    // division by zero poison every velocity with NaN.
                    continue;
                }
                let f = config::GRAVITY_G * (self.bodies[i].mass + self.bodies[j].mass) / d;
                let impulse = Vec2::new(
                    f * (self.positions[j].x - self.positions[i].x) / d,
                    f * (self.positions[j].y - self.positions[i].y) / d,
                );
                let mass_i = self.bodies[i].mass;
                let mass_j = self.bodies[j].mass;
                self.bodies[i].vel += impulse / mass_i;
                self.bodies[j].vel -= impulse / mass_j;
            }
        }

        for body in &mut self.bodies {
            body.pos += body.vel;
            Self::record_trail(body);
        }
    }

    pub fn begin_drag(&mut self, pointer: Vec2) {
        // Last press wins; a stray second press just moves the anchor.
        self.drag = Some(DragGesture { anchor: pointer });
    }

    pub fn end_drag(&mut self, pointer: Vec2) {
        if let Some(gesture) = self.drag.take() {
            let vel = (gesture.anchor - pointer) / config::DRAG_VEL_DIVISOR;
            self.bodies.push(Body::new(
                gesture.anchor,
                vel,
                config::SPAWN_MASS,
                config::SPAWN_RADIUS,
            ));
        }
        // A release without a press is a no-op.
    }

    pub fn drag_gesture(&self) -> Option<DragGesture> {
        self.drag
    }

    pub fn snapshot(&self, out: &mut Vec<BodySnapshot>) {
        out.clear();
        for body in &self.bodies {
            out.push(BodySnapshot {
                pos: body.pos,
                vel: body.vel,
                mass: body.mass,
                radius: body.radius,
                trail: body.trail,
                trail_head: body.trail_head,
                trail_len: body.trail_len,
            });
        }
    }

    pub fn stats(&self) -> WorldStats {
        let mut stats = WorldStats {
            body_count: self.bodies.len(),
            ..WorldStats::default()
        };
        for body in &self.bodies {
            stats.total_mass += body.mass;
            stats.momentum += body.vel * body.mass;
            stats.max_speed = stats.max_speed.max(body.vel.length());
        }
        stats
    }

    pub fn scatter(&mut self, count: usize) {
        for _ in 0..count {
            let pos = Vec2::new(
                self.rng.gen_range(0.0..config::CANVAS_WIDTH),
                self.rng.gen_range(0.0..config::CANVAS_HEIGHT),
            );
            let vel = Vec2::new(
                self.rng
                    .gen_range(-config::SCATTER_SPEED_MAX..config::SCATTER_SPEED_MAX),
                self.rng
                    .gen_range(-config::SCATTER_SPEED_MAX..config::SCATTER_SPEED_MAX),
            );
            let mass = self
                .rng
                .gen_range(config::SCATTER_MASS_MIN..config::SCATTER_MASS_MAX);
            let radius = config::SCATTER_RADIUS_BASE + mass * config::SCATTER_RADIUS_SCALE;
            self.bodies.push(Body::new(pos, vel, mass, radius));
        }
    }

    fn record_trail(body: &mut Body) {
        body.trail_head = (body.trail_head + 1) % TRAIL_LEN;
        body.trail[body.trail_head] = body.pos;
        if body.trail_len < TRAIL_LEN {
            body.trail_len += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    mod drag {
        use super::*;

        #[test]
        fn release_spawns_body_with_scaled_launch_velocity() {
            let mut world = World::new();
            world.begin_drag(Vec2::new(100.0, 100.0));
            world.end_drag(Vec2::new(80.0, 150.0));

            assert_eq!(world.bodies.len(), 1);
            let body = &world.bodies[0];
            assert_eq!(body.pos, Vec2::new(100.0, 100.0));
            assert_eq!(body.vel, Vec2::new(2.0, -5.0));
            assert_eq!(body.mass, 1.0);
            assert_eq!(body.radius, 5.0);
            assert!(world.drag_gesture().is_none());
        }

        #[test]
        fn release_without_press_is_a_noop() {
            let mut world = World::new();
            world.end_drag(Vec2::new(42.0, 42.0));
            assert!(world.bodies.is_empty());
            assert!(world.drag_gesture().is_none());
        }

        #[test]
        fn second_press_overwrites_first_anchor() {
            let mut world = World::new();
            world.begin_drag(Vec2::new(10.0, 10.0));
            world.begin_drag(Vec2::new(30.0, 40.0));
            world.end_drag(Vec2::new(30.0, 40.0));

            assert_eq!(world.bodies.len(), 1);
            assert_eq!(world.bodies[0].pos, Vec2::new(30.0, 40.0));
            assert_eq!(world.bodies[0].vel, Vec2::ZERO);
        }

        #[test]
        fn press_is_visible_until_release() {
            let mut world = World::new();
            world.begin_drag(Vec2::new(5.0, 6.0));
            let gesture = world.drag_gesture().expect("gesture should be active");
            assert_eq!(gesture.anchor, Vec2::new(5.0, 6.0));
        }
    }

    mod step {
        use super::*;

        #[test]
        fn empty_world_steps_without_error() {
            let mut world = World::new();
            world.step();
            assert!(world.bodies.is_empty());
        }

        #[test]
        fn single_resting_body_is_unchanged() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(50.0, 50.0), Vec2::ZERO, 3.0, 5.0));
            world.step();
            assert_eq!(world.bodies[0].pos, Vec2::new(50.0, 50.0));
            assert_eq!(world.bodies[0].vel, Vec2::ZERO);
        }

        #[test]
        fn single_moving_body_drifts_at_constant_velocity() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(0.0, 0.0), Vec2::new(1.5, -0.5), 1.0, 5.0));
            world.step();
            assert_eq!(world.bodies[0].vel, Vec2::new(1.5, -0.5));
            assert_eq!(world.bodies[0].pos, Vec2::new(1.5, -0.5));
        }

        #[test]
        fn two_body_reference_trajectory() {
            // A heavy body at the origin, a light one 100 units away. Each
            // unordered pair is accumulated twice per step, so the impulse
            // magnitude doubles relative to a single-visit scheme.
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::ZERO, Vec2::ZERO, 1000.0, 50.0));
            world
                .bodies
                .push(Body::new(Vec2::new(100.0, 0.0), Vec2::ZERO, 1.0, 5.0));
            world.step();

            // F = 0.01 * 1001 / 100 = 0.1001 per visit
            let f = 0.01_f32 * 1001.0 / 100.0;
            let a = &world.bodies[0];
            let b = &world.bodies[1];
            assert!(approx(a.vel.x, 2.0 * f / 1000.0));
            assert!(approx(a.vel.y, 0.0));
            assert!(approx(b.vel.x, -2.0 * f));
            assert!(approx(b.vel.y, 0.0));
            assert!(approx(a.pos.x, a.vel.x));
            assert!(approx(b.pos.x, 100.0 + b.vel.x));
        }

        #[test]
        fn pair_impulses_are_equal_and_opposite() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(10.0, 20.0), Vec2::ZERO, 7.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::new(-30.0, 45.0), Vec2::ZERO, 2.5, 5.0));
            world.step();

            let a = &world.bodies[0];
            let b = &world.bodies[1];
            assert!(approx(a.vel.x * a.mass, -b.vel.x * b.mass));
            assert!(approx(a.vel.y * a.mass, -b.vel.y * b.mass));
        }

        #[test]
        fn total_momentum_is_conserved() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), 5.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::new(60.0, 10.0), Vec2::new(0.0, -2.0), 3.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::new(-20.0, 80.0), Vec2::new(0.5, 0.5), 8.0, 5.0));
            let before = world.stats().momentum;
            world.step();
            let after = world.stats().momentum;

            assert!((before.x - after.x).abs() < 1e-3);
            assert!((before.y - after.y).abs() < 1e-3);
        }

        #[test]
        fn coincident_bodies_do_not_produce_nan() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(5.0, 5.0), Vec2::ZERO, 1.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::new(5.0, 5.0), Vec2::ZERO, 1.0, 5.0));
            world.step();

            for body in &world.bodies {
                assert!(body.vel.x.is_finite() && body.vel.y.is_finite());
                assert_eq!(body.vel, Vec2::ZERO);
                assert_eq!(body.pos, Vec2::new(5.0, 5.0));
            }
        }

        #[test]
        fn forces_use_positions_from_step_start() {
            // Three bodies on a line. If pair forces read freshly integrated
            // positions the symmetry below breaks down.
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(-50.0, 0.0), Vec2::ZERO, 4.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::new(0.0, 0.0), Vec2::ZERO, 4.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::new(50.0, 0.0), Vec2::ZERO, 4.0, 5.0));
            world.step();

            let left = &world.bodies[0];
            let right = &world.bodies[2];
            assert!(approx(left.vel.x, -right.vel.x));
            assert!(approx(world.bodies[1].vel.x, 0.0));
        }

        #[test]
        fn step_records_trail_sample() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 1.0, 5.0));
            world.step();
            let body = &world.bodies[0];
            assert_eq!(body.trail_len, 2);
            assert_eq!(body.trail[body.trail_head], body.pos);
        }
    }

    mod snapshot {
        use super::*;

        #[test]
        fn fills_buffer_with_current_bodies() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), 5.0, 6.0));
            let mut out = Vec::new();
            world.snapshot(&mut out);

            assert_eq!(out.len(), 1);
            assert_eq!(out[0].pos, Vec2::new(1.0, 2.0));
            assert_eq!(out[0].vel, Vec2::new(3.0, 4.0));
            assert_eq!(out[0].mass, 5.0);
            assert_eq!(out[0].radius, 6.0);
        }

        #[test]
        fn clears_stale_entries_from_reused_buffer() {
            let world = World::new();
            let mut out = vec![BodySnapshot {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                mass: 1.0,
                radius: 1.0,
                trail: [Vec2::ZERO; TRAIL_LEN],
                trail_head: 0,
                trail_len: 0,
            }];
            world.snapshot(&mut out);
            assert!(out.is_empty());
        }
    }

    mod stats {
        use super::*;

        #[test]
        fn aggregates_mass_and_momentum() {
            let mut world = World::new();
            world
                .bodies
                .push(Body::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 3.0, 5.0));
            world
                .bodies
                .push(Body::new(Vec2::ZERO, Vec2::new(0.0, -1.0), 4.0, 5.0));
            let stats = world.stats();

            assert_eq!(stats.body_count, 2);
            assert_eq!(stats.total_mass, 7.0);
            assert_eq!(stats.momentum, Vec2::new(6.0, -4.0));
            assert_eq!(stats.max_speed, 2.0);
        }

        #[test]
        fn empty_world_has_zero_stats() {
            let stats = World::new().stats();
            assert_eq!(stats.body_count, 0);
            assert_eq!(stats.total_mass, 0.0);
            assert_eq!(stats.momentum, Vec2::ZERO);
        }
    }

    mod scatter {
        use super::*;

        #[test]
        fn spawns_requested_number_of_bodies() {
            let mut world = World::new();
            world.scatter(5);
            assert_eq!(world.bodies.len(), 5);
        }

        #[test]
        fn spawned_bodies_stay_on_canvas_with_positive_mass() {
            let mut world = World::new();
            world.scatter(20);
            for body in &world.bodies {
                assert!(body.pos.x >= 0.0 && body.pos.x < crate::config::CANVAS_WIDTH);
                assert!(body.pos.y >= 0.0 && body.pos.y < crate::config::CANVAS_HEIGHT);
                assert!(body.mass > 0.0);
                assert!(body.radius > 0.0);
            }
        }
    }
}
