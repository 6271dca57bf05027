use crate::scene::SolarScene;
use std::f32::consts::TAU;

// Angles grow without bound during normal ticking; past this magnitude they
// are folded back modulo a full turn to keep float precision healthy.
pub(crate) const ANGLE_WRAP_LIMIT: f32 = 1.0e6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClockState {
    Idle,
    Running,
}

// Drives the per-frame update. The host loop decides when (and whether) the
// next tick happens; there is no internal timer and no stop state.
pub(crate) struct Clock {
    state: ClockState,
    ticks: u64,
}

impl Clock {
    pub(crate) fn new() -> Clock {
        Clock {
            state: ClockState::Idle,
            ticks: 0,
        }
    }

    pub(crate) fn state(&self) -> ClockState {
        self.state
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    // One animation step: every body advances spin and revolution before any
    // caller gets to render, so a frame never sees a half-updated system.
    pub(crate) fn tick(&mut self, scene: &mut SolarScene) {
        self.state = ClockState::Running;
        self.ticks = self.ticks.wrapping_add(1);
        advance_transforms(scene);
    }
}

fn wrap_angle(a: f32) -> f32 {
    if a.abs() > ANGLE_WRAP_LIMIT {
        a.rem_euclid(TAU)
    } else {
        a
    }
}

fn advance_transforms(scene: &mut SolarScene) {
    if let Some(central) = scene.central() {
        let node = central.node;
        let rate = central.spin_rate;
        let t = &mut scene.node_mut(node).transform;
        t.rot_y = wrap_angle(t.rot_y + rate);
    }

    for i in 0..scene.bodies().len() {
        let b = &scene.bodies()[i];
        let (node, pivot) = match &b.chain {
            Some(c) => (c.node, c.pivot),
            None => continue,
        };
        let spin_rate = b.spin_rate;
        let orbit_rate = b.orbit_rate;

        let t = &mut scene.node_mut(node).transform;
        t.rot_y = wrap_angle(t.rot_y + spin_rate);
        let t = &mut scene.node_mut(pivot).transform;
        t.rot_y = wrap_angle(t.rot_y + orbit_rate);
    }
}
