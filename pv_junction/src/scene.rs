//! Frame snapshot → shape instances, back to front
//!
//! Pure functions of the snapshot; the renderer just uploads the result.

use glam::Vec2;
use pv_junction::geometry::{Junction, Sun};
use pv_junction::{FrameSnapshot, Particle, ParticleKind, SceneGeometry};

use crate::renderer::ShapeInstance;

const PARTICLE_RADIUS: f32 = 4.0;
const BULB_RADIUS: f32 = 22.0;
const WIRE_WIDTH: f32 = 6.0;
const FLOW_WIDTH: f32 = 5.0;
const FLOW_DASH: f32 = 18.0;
const FLOW_GAP: f32 = 14.0;
/// Dash pattern speed along the wire, units per second
const FLOW_SPEED: f32 = 100.0;

/// sRGB hex colour to the linear RGBA the surface expects
fn srgb(hex: u32, alpha: f32) -> [f32; 4] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0), alpha]
}

fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t)
}

/// Stack of horizontal bands approximating a vertical linear gradient
fn vertical_gradient(
    shapes: &mut Vec<ShapeInstance>,
    min: Vec2,
    size: Vec2,
    top: [f32; 4],
    bottom: [f32; 4],
    bands: usize,
) {
    let band_height = size.y / bands as f32;
    for i in 0..bands {
        let t = (i as f32 + 0.5) / bands as f32;
        shapes.push(ShapeInstance::rect(
            Vec2::new(min.x, min.y + band_height * i as f32),
            Vec2::new(size.x, band_height),
            mix(top, bottom, t),
        ));
    }
}

/// Arrow with a two-stroke head at `to`
fn arrow(shapes: &mut Vec<ShapeInstance>, from: Vec2, to: Vec2, width: f32, color: [f32; 4]) {
    const HEAD: f32 = 6.0;
    shapes.push(ShapeInstance::line(from, to, width, color));
    let delta = to - from;
    let angle = delta.y.atan2(delta.x);
    for side in [-1.0_f32, 1.0] {
        let barb = angle + side * std::f32::consts::FRAC_PI_6;
        let tip = to - Vec2::new(barb.cos(), barb.sin()) * HEAD;
        shapes.push(ShapeInstance::line(to, tip, width, color));
    }
}

/// Dash segments along a polyline, with the pattern slid forward by `shift`
pub fn dashes(points: &[Vec2], dash: f32, gap: f32, shift: f32) -> Vec<(Vec2, Vec2)> {
    let period = dash + gap;
    let phase = shift.rem_euclid(period);
    let mut segments = Vec::new();
    let mut s0 = 0.0;

    for pair in points.windows(2) {
        let (p, q) = (pair[0], pair[1]);
        let len = p.distance(q);
        if len <= f32::EPSILON {
            continue;
        }
        let dir = (q - p) / len;
        let s1 = s0 + len;

        let mut k = ((s0 - phase) / period).floor();
        loop {
            let dash_start = phase + k * period;
            if dash_start >= s1 {
                break;
            }
            let a = dash_start.max(s0);
            let b = (dash_start + dash).min(s1);
            if b > a {
                segments.push((p + dir * (a - s0), p + dir * (b - s0)));
            }
            k += 1.0;
        }
        s0 = s1;
    }
    segments
}

/// The wire route drawn for the external circuit, n-contact to p-contact
pub fn circuit_route(geometry: &SceneGeometry) -> [Vec2; 9] {
    let j = &geometry.junction;
    let c = &geometry.circuit;
    [
        Vec2::new(j.right_contact_x(), j.n_layer_y()),
        Vec2::new(c.top_bus_x, j.n_layer_y()),
        Vec2::new(c.top_bus_x, c.bulb_top_y),
        Vec2::new(c.bulb_x, c.bulb_top_y),
        Vec2::new(c.bulb_x, c.bottom_wire_y),
        Vec2::new(c.left_bottom_x, c.bottom_wire_y),
        Vec2::new(c.left_bottom_x, c.left_rise_y),
        Vec2::new(j.left_contact_x(), c.left_rise_y),
        Vec2::new(j.left_contact_x(), j.p_layer_y()),
    ]
}

pub fn build_scene(frame: &FrameSnapshot<'_>) -> Vec<ShapeInstance> {
    let mut shapes = Vec::with_capacity(512 + frame.particles.len() * 8);

    draw_background(&mut shapes);
    draw_sun(&mut shapes, &frame.geometry.sun, frame.elapsed);
    draw_module(&mut shapes, frame);
    draw_field_indicator(&mut shapes, frame);
    draw_circuit(&mut shapes, frame);
    draw_bulb(&mut shapes, frame);
    for particle in frame.particles {
        draw_particle(&mut shapes, particle);
    }

    shapes
}

fn draw_background(shapes: &mut Vec<ShapeInstance>) {
    let width = common::canvas::WIDTH;
    let height = common::canvas::HEIGHT;
    let stops = [
        (0.0, srgb(0xb3e5fc, 1.0)),
        (0.4, srgb(0xe1f5fe, 1.0)),
        (0.7, srgb(0xf5faff, 1.0)),
        (1.0, srgb(0xe8f5e9, 1.0)),
    ];
    for pair in stops.windows(2) {
        let (t0, top) = pair[0];
        let (t1, bottom) = pair[1];
        vertical_gradient(
            shapes,
            Vec2::new(0.0, t0 * height),
            Vec2::new(width, (t1 - t0) * height),
            top,
            bottom,
            6,
        );
    }

    let cloud = srgb(0xffffff, 0.6);
    for (x, y, size) in [(550.0, 50.0, 40.0), (650.0, 90.0, 30.0), (300.0, 70.0, 25.0)] {
        let at = Vec2::new(x, y);
        shapes.push(ShapeInstance::disc(at, size * 0.5, cloud));
        shapes.push(ShapeInstance::disc(at + Vec2::new(0.4, -0.1) * size, size * 0.4, cloud));
        shapes.push(ShapeInstance::disc(at + Vec2::new(0.8, 0.0) * size, size * 0.45, cloud));
        shapes.push(ShapeInstance::disc(at + Vec2::new(0.4, 0.15) * size, size * 0.35, cloud));
    }
}

fn draw_sun(shapes: &mut Vec<ShapeInstance>, sun: &Sun, elapsed: f32) {
    let center = sun.center();
    shapes.push(ShapeInstance::glow(center, sun.radius * 2.5, srgb(0xffecb3, 0.8)));
    shapes.push(ShapeInstance::disc(center, sun.radius, srgb(0xffc107, 1.0)));
    shapes.push(ShapeInstance::disc(center, sun.radius * 0.85, srgb(0xffee58, 1.0)));
    shapes.push(ShapeInstance::glow(
        center - Vec2::splat(5.0),
        sun.radius * 0.7,
        srgb(0xfffde7, 1.0),
    ));

    // Slowly rotating, pulsing rays
    let count = sun.ray_count.max(1) as f32;
    for i in 0..sun.ray_count {
        let i = i as f32;
        let angle = i / count * std::f32::consts::TAU + elapsed * 0.12;
        let pulse = (elapsed * 2.5 + i * 0.6).sin() * 6.0;
        let dir = Vec2::new(angle.cos(), angle.sin());
        let alpha = (0.6 - i * 0.03).max(0.0);
        shapes.push(ShapeInstance::line(
            center + dir * (sun.radius + 2.0),
            center + dir * (sun.radius + 18.0 + pulse),
            2.0,
            srgb(0xffc107, alpha),
        ));
    }
}

fn draw_lattice(
    shapes: &mut Vec<ShapeInstance>,
    junction: &Junction,
    top: f32,
    height: f32,
    spacing: Vec2,
    alpha: f32,
) {
    let color = srgb(0xffffff, alpha);
    let mut x = junction.left + 8.0;
    while x < junction.right - 8.0 {
        let mut y = top + 6.0;
        while y < top + height - 6.0 {
            shapes.push(ShapeInstance::disc(Vec2::new(x, y), 2.0, color));
            y += spacing.y;
        }
        x += spacing.x;
    }
}

fn draw_module(shapes: &mut Vec<ShapeInstance>, frame: &FrameSnapshot<'_>) {
    let j = &frame.geometry.junction;
    let width = j.width();
    let module_top = j.glass_top - 12.0;
    let module_height = j.p_layer_bottom() + 12.0 - module_top;

    // Frame and white backing
    shapes.push(ShapeInstance::rect(
        Vec2::new(j.left - 15.0, module_top - 8.0),
        Vec2::new(width + 30.0, module_height + 16.0),
        srgb(0x1565c0, 1.0),
    ));
    shapes.push(ShapeInstance::rect(
        Vec2::new(j.left - 6.0, module_top + 2.0),
        Vec2::new(width + 12.0, module_height - 4.0),
        srgb(0xffffff, 1.0),
    ));

    // AR-coated glass
    shapes.push(ShapeInstance::rect(
        Vec2::new(j.left, j.glass_top),
        Vec2::new(width, j.glass_height),
        srgb(0xe3f2fd, 0.9),
    ));

    // N-type layer
    vertical_gradient(
        shapes,
        Vec2::new(j.left, j.n_layer_top),
        Vec2::new(width, j.n_layer_height),
        srgb(0x90caf9, 1.0),
        srgb(0x64b5f6, 1.0),
        4,
    );
    draw_lattice(shapes, j, j.n_layer_top, j.n_layer_height, Vec2::new(18.0, 10.0), 0.35);

    // Depletion region, brighter with a stronger field
    let strength = frame.field.normalized();
    shapes.push(ShapeInstance::rect(
        Vec2::new(j.left, j.depletion_top),
        Vec2::new(width, j.depletion_height),
        srgb(0x81d4fa, 0.3 + strength * 0.4),
    ));

    if frame.field.current > 10.0 || frame.field_pulse > 0.05 {
        let intensity = (frame.field_pulse * 0.5).max(strength * 0.3);
        let sweep = ((frame.elapsed * 4.0).sin() + 1.0) / 2.0;
        let mut shimmer = ShapeInstance::glow(
            Vec2::new(j.left + sweep * width, j.depletion_top + j.depletion_height / 2.0),
            1.0,
            srgb(0x2196f3, intensity),
        );
        shimmer.half_size = [width * 0.2, j.depletion_height / 2.0];
        shapes.push(shimmer);
    }

    // Built-in field arrows, n → p
    let arrow_color = srgb(0x1976d2, 0.3 + strength * 0.5);
    let arrow_width = 1.0 + strength * 0.5;
    let mut x = j.left + 25.0;
    while x < j.right - 15.0 {
        arrow(
            shapes,
            Vec2::new(x, j.depletion_top + 6.0),
            Vec2::new(x, j.depletion_top + j.depletion_height - 6.0),
            arrow_width,
            arrow_color,
        );
        x += 30.0;
    }

    // P-type layer
    vertical_gradient(
        shapes,
        Vec2::new(j.left, j.p_layer_top),
        Vec2::new(width, j.p_layer_height),
        srgb(0xce93d8, 1.0),
        srgb(0xe1bee7, 1.0),
        4,
    );
    draw_lattice(shapes, j, j.p_layer_top, j.p_layer_height, Vec2::new(20.0, 12.0), 0.25);

    // Metal contacts
    let metal = srgb(0x78909c, 1.0);
    shapes.push(ShapeInstance::rect(
        Vec2::new(j.right - 2.0, j.n_layer_top - 3.0),
        Vec2::new(8.0, j.n_layer_height + 15.0),
        metal,
    ));
    shapes.push(ShapeInstance::rect(
        Vec2::new(j.left - 8.0, j.p_layer_top - 3.0),
        Vec2::new(8.0, j.p_layer_height + 10.0),
        metal,
    ));
}

fn draw_field_indicator(shapes: &mut Vec<ShapeInstance>, frame: &FrameSnapshot<'_>) {
    let j = &frame.geometry.junction;
    let origin = Vec2::new(j.right + 30.0, j.depletion_top - 20.0);
    let size = Vec2::new(60.0, j.depletion_height + 40.0);
    shapes.push(ShapeInstance::rect(origin, size, srgb(0xffffff, 0.9)));

    let bar_origin = origin + Vec2::new(10.0, 22.0);
    let bar_size = Vec2::new(12.0, size.y - 35.0);
    shapes.push(ShapeInstance::rect(bar_origin, bar_size, srgb(0xe3f2fd, 1.0)));

    let fill = frame.field.normalized() * bar_size.y;
    if fill > 0.0 {
        vertical_gradient(
            shapes,
            Vec2::new(bar_origin.x, bar_origin.y + bar_size.y - fill),
            Vec2::new(bar_size.x, fill),
            srgb(0xcddc39, 1.0),
            srgb(0x4caf50, 1.0),
            3,
        );
    }
}

fn draw_circuit(shapes: &mut Vec<ShapeInstance>, frame: &FrameSnapshot<'_>) {
    let route = circuit_route(frame.geometry);
    let wire = srgb(0x78909c, 1.0);
    for pair in route.windows(2) {
        shapes.push(ShapeInstance::line(pair[0], pair[1], WIRE_WIDTH, wire));
    }

    if frame.current_flowing() {
        let active = srgb(0x29b6f6, 1.0);
        for (a, b) in dashes(&route, FLOW_DASH, FLOW_GAP, frame.elapsed * FLOW_SPEED) {
            shapes.push(ShapeInstance::line(a, b, FLOW_WIDTH, active));
        }
    }
}

fn draw_bulb(shapes: &mut Vec<ShapeInstance>, frame: &FrameSnapshot<'_>) {
    let c = &frame.geometry.circuit;
    let center = Vec2::new(c.bulb_x, c.bulb_mid_y);
    let lit = frame.bulb_lit();

    if lit {
        shapes.push(ShapeInstance::glow(center, BULB_RADIUS * 2.2, srgb(0xffecb3, 0.7)));
        shapes.push(ShapeInstance::disc(center, BULB_RADIUS, srgb(0xffee58, 1.0)));
        shapes.push(ShapeInstance::glow(
            center - Vec2::new(0.0, 3.0),
            BULB_RADIUS * 0.9,
            srgb(0xffffff, 1.0),
        ));
        shapes.push(ShapeInstance::ring(center, BULB_RADIUS, 1.5, srgb(0xffc107, 1.0)));
    } else {
        shapes.push(ShapeInstance::disc(center, BULB_RADIUS, srgb(0xeceff1, 0.8)));
        shapes.push(ShapeInstance::ring(center, BULB_RADIUS, 1.5, srgb(0xb0bec5, 1.0)));
    }

    // Filament zigzag
    let (filament, width) = if lit {
        (srgb(0xff9800, 1.0), 2.0)
    } else {
        (srgb(0x90a4ae, 1.0), 1.5)
    };
    let zigzag = [
        Vec2::new(-6.0, 6.0),
        Vec2::new(-3.0, -2.0),
        Vec2::new(0.0, 2.0),
        Vec2::new(3.0, 6.0),
        Vec2::new(6.0, -2.0),
    ];
    for pair in zigzag.windows(2) {
        shapes.push(ShapeInstance::line(center + pair[0], center + pair[1], width, filament));
    }

    // Screw base
    shapes.push(ShapeInstance::rect(
        center + Vec2::new(-7.0, BULB_RADIUS - 2.0),
        Vec2::new(14.0, 10.0),
        srgb(0x607d8b, 1.0),
    ));
    for i in 0..2 {
        let y = BULB_RADIUS + 1.0 + i as f32 * 3.0;
        shapes.push(ShapeInstance::line(
            center + Vec2::new(-5.0, y),
            center + Vec2::new(5.0, y),
            1.0,
            srgb(0x78909c, 1.0),
        ));
    }
}

fn draw_particle(shapes: &mut Vec<ShapeInstance>, particle: &Particle) {
    let at = particle.position;
    match particle.kind() {
        ParticleKind::Photon => {
            let trail: Vec<Vec2> = particle.trail().collect();
            let streak = srgb(0xffeb3b, 0.5);
            for pair in trail.windows(2) {
                shapes.push(ShapeInstance::line(pair[0], pair[1], 2.0, streak));
            }
            shapes.push(ShapeInstance::glow(at, PARTICLE_RADIUS * 2.5, srgb(0xffecb3, 0.9)));
            shapes.push(ShapeInstance::disc(at, PARTICLE_RADIUS, srgb(0xffc107, 1.0)));
        }
        ParticleKind::Flash => {
            if let Some((radius, alpha)) = particle.flash_state() {
                if alpha > 0.0 {
                    shapes.push(ShapeInstance::disc(at, radius, srgb(0x00e6ff, alpha * 0.8)));
                }
            }
        }
        ParticleKind::Electron => {
            shapes.push(ShapeInstance::glow(at, PARTICLE_RADIUS * 2.5, srgb(0x64b5f6, 0.9)));
            shapes.push(ShapeInstance::disc(at, PARTICLE_RADIUS, srgb(0x1e88e5, 1.0)));
            // Negative charge mark
            shapes.push(ShapeInstance::rect(
                at - Vec2::new(2.5, 0.5),
                Vec2::new(5.0, 1.0),
                srgb(0xffffff, 1.0),
            ));
        }
        ParticleKind::Hole => {
            shapes.push(ShapeInstance::glow(at, PARTICLE_RADIUS * 2.2, srgb(0xef9a9a, 0.8)));
            shapes.push(ShapeInstance::disc(at, PARTICLE_RADIUS, srgb(0xef5350, 0.2)));
            shapes.push(ShapeInstance::ring(at, PARTICLE_RADIUS + 1.0, 2.0, srgb(0xef5350, 1.0)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::ShapeKind;
    use pv_junction::field::FieldStrength;

    fn snapshot<'a>(
        particles: &'a [Particle],
        field: &'a FieldStrength,
        geometry: &'a SceneGeometry,
        loop_count: u64,
    ) -> FrameSnapshot<'a> {
        FrameSnapshot {
            particles,
            field,
            field_pulse: 0.0,
            phase: 0,
            loop_count,
            elapsed: 1.0,
            is_animating: true,
            geometry,
        }
    }

    #[test]
    fn particles_add_their_own_shapes() {
        let geometry = SceneGeometry::default();
        let field = FieldStrength::default();
        let base = build_scene(&snapshot(&[], &field, &geometry, 0)).len();

        let at = Vec2::new(300.0, 220.0);
        let particles = vec![
            Particle::photon(0, Vec2::new(90.0, 70.0), at),
            Particle::hole(1, at),
            Particle::flash(2, at),
        ];
        let shapes = build_scene(&snapshot(&particles, &field, &geometry, 0));
        // photon: glow + core, hole: glow + fill + ring, flash: disc
        assert_eq!(shapes.len(), base + 2 + 3 + 1);
    }

    #[test]
    fn lit_bulb_glows() {
        let geometry = SceneGeometry::default();
        let field = FieldStrength::default();
        let bulb = Vec2::new(geometry.circuit.bulb_x, geometry.circuit.bulb_mid_y);
        let has_bulb_glow = |shapes: &[ShapeInstance]| {
            shapes
                .iter()
                .any(|s| s.kind() == ShapeKind::Glow && s.center == bulb.to_array())
        };

        let dark = build_scene(&snapshot(&[], &field, &geometry, 0));
        assert!(!has_bulb_glow(&dark[..]));

        let electrons = vec![Particle::electron(0, bulb, &geometry)];
        let lit = build_scene(&snapshot(&electrons, &field, &geometry, 0));
        assert!(has_bulb_glow(&lit[..]));
    }

    #[test]
    fn flow_overlay_follows_loop_count() {
        let geometry = SceneGeometry::default();
        let field = FieldStrength::default();
        let idle = build_scene(&snapshot(&[], &field, &geometry, 0)).len();
        let flowing = build_scene(&snapshot(&[], &field, &geometry, 3)).len();
        assert!(flowing > idle);
    }

    #[test]
    fn dashes_slide_along_a_line() {
        let line = [Vec2::ZERO, Vec2::new(64.0, 0.0)];
        let still = dashes(&line, 18.0, 14.0, 0.0);
        assert_eq!(
            still,
            vec![
                (Vec2::ZERO, Vec2::new(18.0, 0.0)),
                (Vec2::new(32.0, 0.0), Vec2::new(50.0, 0.0)),
            ]
        );

        let shifted = dashes(&line, 18.0, 14.0, 10.0);
        assert_eq!(shifted.len(), 2);
        assert_eq!(shifted[0].0, Vec2::new(10.0, 0.0));
        assert_eq!(shifted[1].1, Vec2::new(60.0, 0.0));
    }

    #[test]
    fn dashes_wrap_around_corners() {
        let corner = [Vec2::ZERO, Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let pieces = dashes(&corner, 18.0, 14.0, 0.0);
        assert_eq!(
            pieces,
            vec![
                (Vec2::ZERO, Vec2::new(10.0, 0.0)),
                (Vec2::new(10.0, 0.0), Vec2::new(10.0, 8.0)),
            ]
        );
    }

    #[test]
    fn route_starts_at_n_contact_and_ends_in_p_layer() {
        let geometry = SceneGeometry::default();
        let route = circuit_route(&geometry);
        assert_eq!(route[0], Vec2::new(544.0, 218.0));
        assert_eq!(route[8], Vec2::new(156.0, 324.0));
    }

    #[test]
    fn srgb_endpoints() {
        assert_eq!(srgb(0xffffff, 0.5), [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(srgb(0x000000, 1.0), [0.0, 0.0, 0.0, 1.0]);
    }
}
