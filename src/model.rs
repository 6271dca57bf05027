use std::f32::consts::PI;

// Labels float this far above the top of a body.
pub(crate) const LABEL_MARGIN: f32 = 0.5;

// Fixed tilt of Saturn's ring plane relative to its body.
pub(crate) const RING_TILT: f32 = PI / 2.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl Rgb {
    pub(crate) fn to_color(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

pub(crate) fn clamp01(x: f32) -> f32 {
    x.max(0.0).min(1.0)
}

pub(crate) fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let aa = a as f32;
    let bb = b as f32;
    (aa + (bb - aa) * t).clamp(0.0, 255.0).round() as u8
}

pub(crate) fn mix_rgb(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = clamp01(t);
    Rgb {
        r: lerp_u8(a.r, b.r, t),
        g: lerp_u8(a.g, b.g, t),
        b: lerp_u8(a.b, b.b, t),
    }
}

pub(crate) fn scale_rgb(a: Rgb, t: f32) -> Rgb {
    let t = clamp01(t);
    Rgb {
        r: ((a.r as f32) * t).clamp(0.0, 255.0) as u8,
        g: ((a.g as f32) * t).clamp(0.0, 255.0) as u8,
        b: ((a.b as f32) * t).clamp(0.0, 255.0) as u8,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DecorationSpec {
    Label,
    Ring { inner: f32, outer: f32, tilt: f32 },
    Glow { scale: f32 },
}

#[derive(Clone, Debug)]
pub(crate) struct BodySpec {
    pub(crate) id: String,
    pub(crate) visual_size: f32,
    pub(crate) orbit_radius: f32,
    pub(crate) spin_rate: f32,
    pub(crate) orbit_rate: f32,
    pub(crate) color: Rgb,
    pub(crate) decorations: Vec<DecorationSpec>,
}

#[derive(Clone, Debug)]
pub(crate) struct CentralSpec {
    pub(crate) id: String,
    pub(crate) visual_size: f32,
    pub(crate) spin_rate: f32,
    pub(crate) color: Rgb,
    pub(crate) decorations: Vec<DecorationSpec>,
}

fn planet(
    id: &str,
    color: Rgb,
    visual_size: f32,
    orbit_radius: f32,
    spin_rate: f32,
    orbit_rate: f32,
) -> BodySpec {
    BodySpec {
        id: id.to_string(),
        visual_size,
        orbit_radius,
        spin_rate,
        orbit_rate,
        color,
        decorations: vec![DecorationSpec::Label],
    }
}

pub(crate) fn default_system() -> (CentralSpec, Vec<BodySpec>) {
    let sun = CentralSpec {
        id: "Sun".to_string(),
        visual_size: 5.0,
        spin_rate: 0.005,
        color: Rgb { r: 255, g: 200, b: 80 },
        decorations: vec![DecorationSpec::Glow { scale: 15.0 }],
    };

    let mut planets = vec![
        planet("Mercury", Rgb { r: 150, g: 150, b: 160 }, 0.5, 6.0, 0.01, 0.02),
        planet("Venus", Rgb { r: 235, g: 190, b: 110 }, 0.9, 9.0, 0.008, 0.015),
        planet("Earth", Rgb { r: 90, g: 160, b: 220 }, 1.0, 12.0, 0.01, 0.01),
        planet("Mars", Rgb { r: 210, g: 90, b: 50 }, 0.7, 15.0, 0.009, 0.008),
        planet("Jupiter", Rgb { r: 220, g: 175, b: 130 }, 2.5, 20.0, 0.006, 0.007),
        planet("Saturn", Rgb { r: 220, g: 195, b: 140 }, 2.0, 27.0, 0.005, 0.006),
        planet("Uranus", Rgb { r: 150, g: 215, b: 215 }, 1.5, 33.0, 0.004, 0.004),
        planet("Neptune", Rgb { r: 90, g: 130, b: 215 }, 1.5, 39.0, 0.003, 0.003),
    ];

    // rings ride on Saturn and share its spin
    planets[5].decorations.push(DecorationSpec::Ring {
        inner: 2.5,
        outer: 4.5,
        tilt: RING_TILT,
    });

    (sun, planets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_system_shape() {
        let (sun, planets) = default_system();
        assert_eq!(sun.id, "Sun");
        assert_eq!(planets.len(), 8);

        let names: Vec<&str> = planets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            names,
            [
                "Mercury", "Venus", "Earth", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune"
            ]
        );

        let saturn = &planets[5];
        assert!(
            saturn
                .decorations
                .iter()
                .any(|d| matches!(d, DecorationSpec::Ring { .. })),
            "Saturn should carry a ring"
        );
        for p in &planets {
            assert!(
                p.decorations.contains(&DecorationSpec::Label),
                "{} should carry a label",
                p.id
            );
        }
    }

    #[test]
    fn color_mixing_endpoints() {
        let a = Rgb { r: 0, g: 100, b: 200 };
        let b = Rgb { r: 255, g: 0, b: 100 };
        assert_eq!(mix_rgb(a, b, 0.0), a);
        assert_eq!(mix_rgb(a, b, 1.0), b);
        assert_eq!(scale_rgb(b, 0.0), Rgb { r: 0, g: 0, b: 0 });
    }
}
