use crate::assets::{AssetServer, AssetState};
use crate::camera::{Camera, ASPECT_X};
use crate::model::{clamp01, lerp, mix_rgb, scale_rgb, Rgb};
use crate::scene::{Decoration, NodeId, SolarScene, Vec3};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::f32::consts::TAU;
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Cell {
    pub(crate) fn blank(bg: Color) -> Self {
        Self {
            ch: ' ',
            fg: Color::Reset,
            bg,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::blank(Color::Black); (w as usize) * (h as usize)],
        }
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            *c = Cell::blank(bg);
        }
    }

    pub(crate) fn write_str(&mut self, x: i32, y: i32, s: &str, fg: Color, bg: Color) {
        if y < 0 || y >= self.h as i32 {
            return;
        }
        let mut xi = x;
        for ch in s.chars() {
            if xi >= self.w as i32 {
                break;
            }
            if xi >= 0 {
                let i = self.idx(xi as u16, y as u16);
                self.cells[i] = Cell { ch, fg, bg };
            }
            xi += 1;
        }
    }
}

pub(crate) fn box_draw(
    buf: &mut CellBuffer,
    x0: u16,
    y0: u16,
    bw: u16,
    bh: u16,
    fg: Color,
    bg: Color,
) {
    if bw < 2 || bh < 2 {
        return;
    }
    let x1 = x0.saturating_add(bw - 1);
    let y1 = y0.saturating_add(bh - 1);

    for x in x0 + 1..x1 {
        buf.set(x, y0, Cell { ch: '─', fg, bg });
        buf.set(x, y1, Cell { ch: '─', fg, bg });
    }
    for y in y0 + 1..y1 {
        buf.set(x0, y, Cell { ch: '│', fg, bg });
        buf.set(x1, y, Cell { ch: '│', fg, bg });
    }
    buf.set(x0, y0, Cell { ch: '┌', fg, bg });
    buf.set(x1, y0, Cell { ch: '┐', fg, bg });
    buf.set(x0, y1, Cell { ch: '└', fg, bg });
    buf.set(x1, y1, Cell { ch: '┘', fg, bg });
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let cols = cols.max(40);
        let rows = rows.max(12);
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        let c = c.max(40);
        let r = r.max(12);
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        execute!(self.out, terminal::Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Star field backdrop
------------------------------ */

#[derive(Clone, Copy, Debug)]
pub(crate) struct Star {
    pub(crate) pos: Vec3,
    pub(crate) phase: f32,
    pub(crate) glint: f32,
}

pub(crate) fn build_star_field(count: usize, spread: f32, seed: u64) -> Vec<Star> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half = spread * 0.5;
    let mut stars = Vec::with_capacity(count);
    for _ in 0..count {
        stars.push(Star {
            pos: Vec3::new(
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
                rng.gen_range(-half..half),
            ),
            phase: rng.gen_range(0.0..TAU),
            glint: rng.gen_range(0.35..1.0),
        });
    }
    stars
}

/* -----------------------------
   3D pass: depth-sorted painter into the cell buffer
------------------------------ */

struct DrawItem {
    depth: f32,
    x: u16,
    y: u16,
    cell: Cell,
}

fn push_item(items: &mut Vec<DrawItem>, w: u16, h: u16, x: f32, y: f32, depth: f32, cell: Cell) {
    if x < 0.0 || y < 0.0 {
        return;
    }
    let (xi, yi) = (x as u16, y as u16);
    if xi >= w || yi >= h {
        return;
    }
    items.push(DrawItem {
        depth,
        x: xi,
        y: yi,
        cell,
    });
}

const SHADE_RAMP: [char; 4] = ['░', '▒', '▓', '█'];

fn shade_char(intensity: f32) -> char {
    let i = (clamp01(intensity) * (SHADE_RAMP.len() as f32 - 0.001)) as usize;
    SHADE_RAMP[i]
}

// Fills the projected disc of a sphere. Surface color scrolls with the spin
// angle so rotation stays visible even on a featureless ball.
#[allow(clippy::too_many_arguments)]
fn draw_sphere(
    items: &mut Vec<DrawItem>,
    w: u16,
    h: u16,
    px: f32,
    py: f32,
    depth: f32,
    radius_cells: f32,
    spin: f32,
    base: Rgb,
    accent: Rgb,
    shadow: Rgb,
    light: Option<(f32, f32)>,
    bg: Color,
) {
    if radius_cells < 0.6 {
        push_item(
            items,
            w,
            h,
            px,
            py,
            depth,
            Cell {
                ch: '•',
                fg: base.to_color(),
                bg,
            },
        );
        return;
    }

    let rx = radius_cells / ASPECT_X;
    let x0 = (px - rx).floor().max(0.0) as i32;
    let x1 = (px + rx).ceil() as i32;
    let y0 = (py - radius_cells).floor().max(0.0) as i32;
    let y1 = (py + radius_cells).ceil() as i32;

    // light direction in screen space, z toward the viewer
    let (lx, ly, lz) = match light {
        Some((dx, dy)) => {
            let l = (dx * dx + dy * dy + 0.45).sqrt().max(1e-6);
            (dx / l, dy / l, 0.67 / l)
        }
        None => (0.0, 0.0, 1.0),
    };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let nx = ((x as f32 + 0.5) - px) * ASPECT_X / radius_cells;
            let ny = ((y as f32 + 0.5) - py) / radius_cells;
            let d2 = nx * nx + ny * ny;
            if d2 > 1.0 {
                continue;
            }
            let nz = (1.0 - d2).sqrt();

            let lon = nx.atan2(nz) + spin;
            let lat = (-ny).asin();
            let band = 0.5 + 0.5 * (lon * 3.0 + lat * 2.0).sin();
            let surface = mix_rgb(base, accent, band * 0.55);

            let intensity = match light {
                Some(_) => {
                    let ndotl = (nx * lx + (-ny) * ly + nz * lz).max(0.0);
                    0.18 + 0.82 * ndotl
                }
                // emissive: bright all over with a faint granulation
                None => 0.82 + 0.18 * band,
            };

            let col = mix_rgb(shadow, surface, clamp01(intensity));
            push_item(
                items,
                w,
                h,
                x as f32,
                y as f32,
                depth,
                Cell {
                    ch: shade_char(intensity),
                    fg: col.to_color(),
                    bg,
                },
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn render_scene(
    buf: &mut CellBuffer,
    scene: &SolarScene,
    cam: &Camera,
    assets: &AssetServer,
    stars: &[Star],
    t_real: f32,
    show_orbits: bool,
) {
    let w = buf.w;
    let h = buf.h;
    let bg = Color::Black;
    let edge = Rgb { r: 80, g: 95, b: 120 };

    let mut items: Vec<DrawItem> = Vec::with_capacity(1024);

    for s in stars {
        let p = match cam.project(s.pos, w, h) {
            Some(p) => p,
            None => continue,
        };
        let tw = (t_real * 0.65 + s.phase).sin() * 0.5 + 0.5;
        let b = lerp(0.2, 1.0, tw * s.glint);
        let c = (40.0 + b * 180.0).clamp(0.0, 255.0) as u8;
        let ch = if b > 0.82 {
            '✦'
        } else if b > 0.62 {
            '•'
        } else {
            '·'
        };
        let fg = Color::Rgb {
            r: c,
            g: c,
            b: ((c as u16) + 25).min(255) as u8,
        };
        push_item(&mut items, w, h, p.x, p.y, p.depth, Cell { ch, fg, bg });
    }

    if show_orbits {
        for (bi, body) in scene.bodies().iter().enumerate() {
            if body.chain.is_none() || body.orbit_radius <= 0.0 {
                continue;
            }
            let r = body.orbit_radius;
            let steps = ((r * (0.65 * h as f32) / cam.dist) * 6.0).max(40.0) as i32;
            for s in 0..steps {
                if (s + bi as i32) % 3 != 0 {
                    continue;
                }
                let a = TAU * (s as f32 / steps as f32);
                let p3 = Vec3::new(r * a.cos(), 0.0, r * a.sin());
                if let Some(p) = cam.project(p3, w, h) {
                    push_item(
                        &mut items,
                        w,
                        h,
                        p.x,
                        p.y,
                        p.depth,
                        Cell {
                            ch: '·',
                            fg: edge.to_color(),
                            bg,
                        },
                    );
                }
            }
        }
    }

    if let Some(central) = scene.central() {
        let pos = scene.world_position(central.node);
        if let Some(p) = cam.project(pos, w, h) {
            let radius_cells = central.visual_size * p.scale;
            let theme = assets.theme(&central.id);
            let base = theme.map_or(central.color, |t| t.base);
            let accent = theme.map_or(Rgb { r: 255, g: 240, b: 170 }, |t| t.accent);
            let shadow = theme.map_or(Rgb { r: 90, g: 40, b: 0 }, |t| t.shadow);

            for d in &central.decorations {
                if let Decoration::Glow { scale, .. } = d {
                    draw_glow(&mut items, w, h, p.x, p.y, p.depth, radius_cells, *scale, central.visual_size, bg);
                }
            }
            draw_sphere(
                &mut items,
                w,
                h,
                p.x,
                p.y,
                p.depth,
                radius_cells,
                scene.central_spin_angle(),
                base,
                accent,
                shadow,
                None,
                bg,
            );
        }
    }

    let sun_screen = scene
        .central()
        .and_then(|c| cam.project(scene.world_position(c.node), w, h));

    for body in scene.bodies() {
        let chain = match &body.chain {
            Some(c) => c,
            None => continue,
        };
        let pos = scene.world_position(chain.node);
        let p = match cam.project(pos, w, h) {
            Some(p) => p,
            None => continue,
        };
        let radius_cells = body.visual_size * p.scale;

        let theme = assets.theme(&body.id);
        let base = theme.map_or(body.color, |t| t.base);
        let accent = theme.map_or(mix_rgb(body.color, Rgb { r: 255, g: 255, b: 255 }, 0.45), |t| {
            t.accent
        });
        let shadow = theme.map_or(scale_rgb(body.color, 0.18), |t| t.shadow);

        // lit from the central body
        let light = sun_screen
            .as_ref()
            .map(|s| ((s.x - p.x) * ASPECT_X, -(s.y - p.y)));

        draw_sphere(
            &mut items,
            w,
            h,
            p.x,
            p.y,
            p.depth,
            radius_cells,
            scene.spin_angle(body),
            base,
            accent,
            shadow,
            light,
            bg,
        );

        for d in &chain.decorations {
            if let Decoration::Ring { node, inner, outer } = d {
                draw_ring(&mut items, scene, cam, w, h, *node, *inner, *outer, bg);
            }
        }
    }

    // far to near, so closer items overwrite
    items.sort_by(|a, b| b.depth.partial_cmp(&a.depth).unwrap_or(std::cmp::Ordering::Equal));
    for it in items {
        buf.set(it.x, it.y, it.cell);
    }
}

// Halo behind the luminous body. Drawn opaque-dithered, slightly deeper than
// the body so the disc always wins the overlap.
#[allow(clippy::too_many_arguments)]
fn draw_glow(
    items: &mut Vec<DrawItem>,
    w: u16,
    h: u16,
    px: f32,
    py: f32,
    depth: f32,
    body_radius_cells: f32,
    glow_scale: f32,
    body_size: f32,
    bg: Color,
) {
    if body_size <= 0.0 {
        return;
    }
    let halo = (glow_scale * 0.5) / body_size; // halo radius in body radii
    let ry = body_radius_cells * halo;
    let rx = ry / ASPECT_X;
    let x0 = (px - rx).floor().max(0.0) as i32;
    let x1 = (px + rx).ceil() as i32;
    let y0 = (py - ry).floor().max(0.0) as i32;
    let y1 = (py + ry).ceil() as i32;

    let orange = Rgb { r: 255, g: 165, b: 0 };

    for y in y0..=y1 {
        for x in x0..=x1 {
            let nx = ((x as f32 + 0.5) - px) * ASPECT_X / body_radius_cells;
            let ny = ((y as f32 + 0.5) - py) / body_radius_cells;
            let d = (nx * nx + ny * ny).sqrt();
            if d <= 1.0 || d > halo {
                continue;
            }
            let fall = clamp01(1.0 - (d - 1.0) / (halo - 1.0).max(1e-3));
            let th = (((x * 3 + y * 5) & 7) as f32 + 0.5) / 8.0;
            if fall * fall < th {
                continue;
            }
            let col = scale_rgb(orange, 0.35 + 0.65 * fall);
            push_item(
                items,
                w,
                h,
                x as f32,
                y as f32,
                depth + 0.05,
                Cell {
                    ch: if fall > 0.6 { '░' } else { '·' },
                    fg: col.to_color(),
                    bg,
                },
            );
        }
    }
}

// Rings sample the annulus in its own tilted node frame, so they follow the
// body's spin through the transform chain rather than any screen-space trick.
#[allow(clippy::too_many_arguments)]
fn draw_ring(
    items: &mut Vec<DrawItem>,
    scene: &SolarScene,
    cam: &Camera,
    w: u16,
    h: u16,
    node: NodeId,
    inner: f32,
    outer: f32,
    bg: Color,
) {
    let grey = Rgb { r: 170, g: 170, b: 170 };
    let radial_steps = 3;
    for ri in 0..radial_steps {
        let r = inner + (outer - inner) * (ri as f32 + 0.5) / radial_steps as f32;
        let steps = ((r * (0.65 * h as f32) / cam.dist) * 8.0).max(64.0) as i32;
        for s in 0..steps {
            let a = TAU * (s as f32 / steps as f32);
            let local = Vec3::new(r * a.cos(), r * a.sin(), 0.0);
            let world = scene.world_point(node, local);
            if let Some(p) = cam.project(world, w, h) {
                let band = 0.5 + 0.5 * ((r / outer) * 10.0).sin();
                let col = mix_rgb(scale_rgb(grey, 0.55), grey, band);
                push_item(
                    items,
                    w,
                    h,
                    p.x,
                    p.y,
                    p.depth,
                    Cell {
                        ch: '·',
                        fg: col.to_color(),
                        bg,
                    },
                );
            }
        }
    }
}

/* -----------------------------
   Overlay pass: labels and HUD, no depth test
------------------------------ */

pub(crate) fn label_anchor(
    scene: &SolarScene,
    cam: &Camera,
    node: NodeId,
    w: u16,
    h: u16,
) -> Option<(i32, i32)> {
    let p = cam.project(scene.world_position(node), w, h)?;
    Some((p.x.round() as i32, p.y.round() as i32))
}

pub(crate) struct HudState {
    pub(crate) paused: bool,
    pub(crate) ticks: u64,
    pub(crate) show_labels: bool,
    pub(crate) show_orbits: bool,
}

pub(crate) fn render_overlay(
    buf: &mut CellBuffer,
    scene: &SolarScene,
    cam: &Camera,
    assets: &AssetServer,
    hud: &HudState,
) {
    let w = buf.w;
    let h = buf.h;
    let bg = Color::Black;
    let fg = Color::Rgb { r: 220, g: 220, b: 220 };
    let dim = Color::Rgb { r: 130, g: 130, b: 130 };
    let edge = Color::Rgb { r: 80, g: 95, b: 120 };

    if hud.show_labels {
        for body in scene.bodies() {
            let chain = match &body.chain {
                Some(c) => c,
                None => continue,
            };
            for d in &chain.decorations {
                if let Decoration::Label { node, text } = d {
                    if let Some((x, y)) = label_anchor(scene, cam, *node, w, h) {
                        let x0 = x - (text.chars().count() as i32) / 2;
                        buf.write_str(x0, y, text, fg, bg);
                    }
                }
            }
        }
    }

    // right-hand panel
    let hud_w = 26u16.min(w / 3);
    if hud_w < 18 {
        return;
    }
    let x0 = w - hud_w;
    box_draw(buf, x0, 0, hud_w, h, edge, bg);

    let tx = (x0 + 2) as i32;
    let mut ty = 1i32;
    buf.write_str(tx, ty, "solarsystem", fg, bg);
    ty += 2;
    buf.write_str(
        tx,
        ty,
        &format!("state: {}", if hud.paused { "paused" } else { "running" }),
        dim,
        bg,
    );
    ty += 1;
    buf.write_str(tx, ty, &format!("tick:  {}", hud.ticks), dim, bg);
    ty += 1;
    buf.write_str(
        tx,
        ty,
        &format!("cam:   d{:.0} y{:.0}°", cam.dist, cam.yaw.to_degrees() % 360.0),
        dim,
        bg,
    );
    ty += 1;
    buf.write_str(
        tx,
        ty,
        &format!(
            "labels {} | orbits {}",
            if hud.show_labels { "on" } else { "off" },
            if hud.show_orbits { "on" } else { "off" }
        ),
        dim,
        bg,
    );
    ty += 2;

    buf.write_str(tx, ty, "bodies", fg, bg);
    ty += 1;
    if let Some(c) = scene.central() {
        buf.write_str(tx, ty, &format!("● {}", c.id), dim, bg);
        ty += 1;
    }
    for body in scene.bodies() {
        if ty >= h as i32 - 9 {
            break;
        }
        let mark = match assets.state(&body.id) {
            AssetState::Ready(_) => '●',
            AssetState::Pending => '◌',
            AssetState::Failed => '·',
        };
        buf.write_str(tx, ty, &format!("{} {}", mark, body.id), dim, bg);
        ty += 1;
    }

    let mut cy = h as i32 - 8;
    buf.write_str(tx, cy, "controls", fg, bg);
    cy += 1;
    for line in [
        "arrows/a/d orbit view",
        "w/s zoom  r reset",
        "l labels  o orbits",
        "p/space pause",
        "q quit",
    ] {
        buf.write_str(tx, cy, line, dim, bg);
        cy += 1;
    }
}
