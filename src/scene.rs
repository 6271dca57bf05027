use crate::model::{BodySpec, CentralSpec, DecorationSpec, Rgb, LABEL_MARGIN};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Vec3 {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) z: f32,
}

impl Vec3 {
    pub(crate) const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub(crate) fn new(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3 { x, y, z }
    }

    pub(crate) fn sub(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    pub(crate) fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

// Local transform of a node: tilt about X, then rotation about Y, then the
// offset into the parent frame. Spin and revolution both live in rot_y, on
// different nodes of the same chain.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Transform {
    pub(crate) rot_y: f32,
    pub(crate) tilt_x: f32,
    pub(crate) offset: Vec3,
}

impl Transform {
    pub(crate) fn identity() -> Transform {
        Transform {
            rot_y: 0.0,
            tilt_x: 0.0,
            offset: Vec3::ZERO,
        }
    }

    fn offset_by(offset: Vec3) -> Transform {
        Transform {
            rot_y: 0.0,
            tilt_x: 0.0,
            offset,
        }
    }

    pub(crate) fn apply(&self, p: Vec3) -> Vec3 {
        let (sx, cx) = self.tilt_x.sin_cos();
        let p = Vec3::new(p.x, cx * p.y - sx * p.z, sx * p.y + cx * p.z);
        let (sy, cy) = self.rot_y.sin_cos();
        let p = Vec3::new(cy * p.x + sy * p.z, p.y, -sy * p.x + cy * p.z);
        Vec3::new(
            p.x + self.offset.x,
            p.y + self.offset.y,
            p.z + self.offset.z,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeId(usize);

#[derive(Clone, Copy, Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) transform: Transform,
}

#[derive(Clone, Debug)]
pub(crate) enum Decoration {
    Label { node: NodeId, text: String },
    Ring { node: NodeId, inner: f32, outer: f32 },
    Glow { node: NodeId, scale: f32 },
}

// Node handles for one orbiting body: pivot at the origin owning the body
// mesh offset by the orbit radius, decorations hanging off the body.
#[derive(Clone, Debug)]
pub(crate) struct BodyChain {
    pub(crate) pivot: NodeId,
    pub(crate) node: NodeId,
    pub(crate) decorations: Vec<Decoration>,
}

#[derive(Clone, Debug)]
pub(crate) struct CelestialBody {
    pub(crate) id: String,
    pub(crate) visual_size: f32,
    pub(crate) orbit_radius: f32,
    pub(crate) spin_rate: f32,
    pub(crate) orbit_rate: f32,
    pub(crate) color: Rgb,
    pub(crate) decoration_specs: Vec<DecorationSpec>,
    pub(crate) chain: Option<BodyChain>,
}

#[derive(Clone, Debug)]
pub(crate) struct CentralBody {
    pub(crate) id: String,
    pub(crate) visual_size: f32,
    pub(crate) spin_rate: f32,
    pub(crate) color: Rgb,
    pub(crate) node: NodeId,
    pub(crate) decorations: Vec<Decoration>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum SceneError {
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),
    #[error("hierarchy already built for {0}")]
    AlreadyBuilt(String),
    #[error("invalid spec for {id}: {field} must be non-negative")]
    InvalidSpec { id: String, field: &'static str },
}

pub(crate) type BodyId = usize;

// All bodies, pivots and decorations of one animated system. Owned by the
// app and passed by reference to the updater and the renderer.
#[derive(Default)]
pub(crate) struct SolarScene {
    nodes: Vec<Node>,
    bodies: Vec<CelestialBody>,
    central: Option<CentralBody>,
}

impl SolarScene {
    pub(crate) fn new() -> SolarScene {
        SolarScene::default()
    }

    fn id_in_use(&self, id: &str) -> bool {
        self.bodies.iter().any(|b| b.id == id)
            || self.central.as_ref().map_or(false, |c| c.id == id)
    }

    fn alloc_node(&mut self, parent: Option<NodeId>, transform: Transform) -> NodeId {
        self.nodes.push(Node { parent, transform });
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    // Registers an orbiting body. The pivot chain is attached separately by
    // build_body; until then the body has no nodes.
    pub(crate) fn add_body(&mut self, spec: BodySpec) -> Result<BodyId, SceneError> {
        validate(&spec.id, "visual_size", spec.visual_size)?;
        validate(&spec.id, "orbit_radius", spec.orbit_radius)?;
        validate(&spec.id, "spin_rate", spec.spin_rate)?;
        validate(&spec.id, "orbit_rate", spec.orbit_rate)?;
        if self.id_in_use(&spec.id) {
            return Err(SceneError::DuplicateIdentifier(spec.id));
        }

        self.bodies.push(CelestialBody {
            id: spec.id,
            visual_size: spec.visual_size,
            orbit_radius: spec.orbit_radius,
            spin_rate: spec.spin_rate,
            orbit_rate: spec.orbit_rate,
            color: spec.color,
            decoration_specs: spec.decorations,
            chain: None,
        });
        Ok(self.bodies.len() - 1)
    }

    // Constructs the transform chain for a registered body: an orbit pivot
    // at the world origin, the body offset along +X, and one child node per
    // decoration. Calling twice for the same body fails and changes nothing.
    pub(crate) fn build_body(&mut self, idx: BodyId) -> Result<(), SceneError> {
        if self.bodies[idx].chain.is_some() {
            return Err(SceneError::AlreadyBuilt(self.bodies[idx].id.clone()));
        }

        let orbit_radius = self.bodies[idx].orbit_radius;
        let visual_size = self.bodies[idx].visual_size;
        let label_text = self.bodies[idx].id.clone();
        let specs = self.bodies[idx].decoration_specs.clone();

        let pivot = self.alloc_node(None, Transform::identity());
        let node = self.alloc_node(
            Some(pivot),
            Transform::offset_by(Vec3::new(orbit_radius, 0.0, 0.0)),
        );

        let mut decorations = Vec::with_capacity(specs.len());
        for spec in &specs {
            match *spec {
                DecorationSpec::Label => {
                    let n = self.alloc_node(
                        Some(node),
                        Transform::offset_by(Vec3::new(0.0, visual_size + LABEL_MARGIN, 0.0)),
                    );
                    decorations.push(Decoration::Label {
                        node: n,
                        text: label_text.clone(),
                    });
                }
                DecorationSpec::Ring { inner, outer, tilt } => {
                    let n = self.alloc_node(
                        Some(node),
                        Transform {
                            rot_y: 0.0,
                            tilt_x: tilt,
                            offset: Vec3::ZERO,
                        },
                    );
                    decorations.push(Decoration::Ring {
                        node: n,
                        inner,
                        outer,
                    });
                }
                DecorationSpec::Glow { scale } => {
                    let n = self.alloc_node(Some(node), Transform::identity());
                    decorations.push(Decoration::Glow { node: n, scale });
                }
            }
        }

        self.bodies[idx].chain = Some(BodyChain {
            pivot,
            node,
            decorations,
        });
        Ok(())
    }

    // The central body is the degenerate case: radius zero, no pivot, built
    // in one step. Only one may exist.
    pub(crate) fn set_central(&mut self, spec: CentralSpec) -> Result<(), SceneError> {
        validate(&spec.id, "visual_size", spec.visual_size)?;
        validate(&spec.id, "spin_rate", spec.spin_rate)?;
        if let Some(c) = &self.central {
            return Err(SceneError::AlreadyBuilt(c.id.clone()));
        }
        if self.id_in_use(&spec.id) {
            return Err(SceneError::DuplicateIdentifier(spec.id));
        }

        let node = self.alloc_node(None, Transform::identity());
        let mut decorations = Vec::with_capacity(spec.decorations.len());
        for d in &spec.decorations {
            match *d {
                DecorationSpec::Glow { scale } => {
                    let n = self.alloc_node(Some(node), Transform::identity());
                    decorations.push(Decoration::Glow { node: n, scale });
                }
                DecorationSpec::Label => {
                    let n = self.alloc_node(
                        Some(node),
                        Transform::offset_by(Vec3::new(
                            0.0,
                            spec.visual_size + LABEL_MARGIN,
                            0.0,
                        )),
                    );
                    decorations.push(Decoration::Label {
                        node: n,
                        text: spec.id.clone(),
                    });
                }
                DecorationSpec::Ring { inner, outer, tilt } => {
                    let n = self.alloc_node(
                        Some(node),
                        Transform {
                            rot_y: 0.0,
                            tilt_x: tilt,
                            offset: Vec3::ZERO,
                        },
                    );
                    decorations.push(Decoration::Ring {
                        node: n,
                        inner,
                        outer,
                    });
                }
            }
        }

        self.central = Some(CentralBody {
            id: spec.id,
            visual_size: spec.visual_size,
            spin_rate: spec.spin_rate,
            color: spec.color,
            node,
            decorations,
        });
        Ok(())
    }

    // Bodies in creation order.
    pub(crate) fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    pub(crate) fn central(&self) -> Option<&CentralBody> {
        self.central.as_ref()
    }

    // Composes a node-local point into the world frame by walking ancestors.
    pub(crate) fn world_point(&self, node: NodeId, local: Vec3) -> Vec3 {
        let mut p = local;
        let mut cur = Some(node);
        while let Some(id) = cur {
            let n = &self.nodes[id.0];
            p = n.transform.apply(p);
            cur = n.parent;
        }
        p
    }

    pub(crate) fn world_position(&self, node: NodeId) -> Vec3 {
        self.world_point(node, Vec3::ZERO)
    }

    pub(crate) fn spin_angle(&self, body: &CelestialBody) -> f32 {
        body.chain
            .as_ref()
            .map_or(0.0, |c| self.nodes[c.node.0].transform.rot_y)
    }

    pub(crate) fn orbit_angle(&self, body: &CelestialBody) -> f32 {
        body.chain
            .as_ref()
            .map_or(0.0, |c| self.nodes[c.pivot.0].transform.rot_y)
    }

    pub(crate) fn central_spin_angle(&self) -> f32 {
        self.central
            .as_ref()
            .map_or(0.0, |c| self.nodes[c.node.0].transform.rot_y)
    }
}

fn validate(id: &str, field: &'static str, value: f32) -> Result<(), SceneError> {
    if value < 0.0 || !value.is_finite() {
        return Err(SceneError::InvalidSpec {
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_system, DecorationSpec, Rgb};
    use std::f32::consts::PI;

    const GREY: Rgb = Rgb { r: 128, g: 128, b: 128 };

    fn spec(id: &str, size: f32, radius: f32, spin: f32, orbit: f32) -> BodySpec {
        BodySpec {
            id: id.to_string(),
            visual_size: size,
            orbit_radius: radius,
            spin_rate: spin,
            orbit_rate: orbit,
            color: GREY,
            decorations: vec![DecorationSpec::Label],
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn close_v(a: Vec3, b: Vec3) -> bool {
        a.sub(b).len() < 1e-3
    }

    #[test]
    fn duplicate_identifier_rejected() {
        let mut scene = SolarScene::new();
        scene.add_body(spec("Mars", 0.7, 15.0, 0.009, 0.008)).unwrap();
        let err = scene
            .add_body(spec("Mars", 1.0, 20.0, 0.01, 0.01))
            .unwrap_err();
        assert_eq!(err, SceneError::DuplicateIdentifier("Mars".to_string()));
        assert_eq!(scene.bodies().len(), 1, "registry must keep first Mars only");
    }

    #[test]
    fn central_id_shares_namespace() {
        let mut scene = SolarScene::new();
        let (mut sun, _) = default_system();
        sun.id = "Sol".to_string();
        scene.set_central(sun).unwrap();
        let err = scene.add_body(spec("Sol", 1.0, 5.0, 0.01, 0.01)).unwrap_err();
        assert_eq!(err, SceneError::DuplicateIdentifier("Sol".to_string()));
    }

    #[test]
    fn second_central_rejected() {
        let mut scene = SolarScene::new();
        let (sun, _) = default_system();
        scene.set_central(sun.clone()).unwrap();
        let mut other = sun;
        other.id = "OtherSun".to_string();
        assert!(matches!(
            scene.set_central(other),
            Err(SceneError::AlreadyBuilt(_))
        ));
    }

    #[test]
    fn negative_fields_rejected() {
        let mut scene = SolarScene::new();
        for (field, s) in [
            ("visual_size", spec("X", -1.0, 5.0, 0.1, 0.1)),
            ("orbit_radius", spec("X", 1.0, -5.0, 0.1, 0.1)),
            ("spin_rate", spec("X", 1.0, 5.0, -0.1, 0.1)),
            ("orbit_rate", spec("X", 1.0, 5.0, 0.1, -0.1)),
        ] {
            let err = scene.add_body(s).unwrap_err();
            assert_eq!(
                err,
                SceneError::InvalidSpec {
                    id: "X".to_string(),
                    field
                }
            );
        }
        assert!(scene.bodies().is_empty());
    }

    #[test]
    fn build_twice_fails_and_leaves_state() {
        let mut scene = SolarScene::new();
        let earth = scene.add_body(spec("Earth", 1.0, 12.0, 0.01, 0.01)).unwrap();
        scene.build_body(earth).unwrap();

        let chain = scene.bodies()[0].chain.clone().unwrap();
        scene.node_mut(chain.pivot).transform.rot_y = 1.25;

        let err = scene.build_body(earth).unwrap_err();
        assert_eq!(err, SceneError::AlreadyBuilt("Earth".to_string()));

        let after = scene.bodies()[0].chain.clone().unwrap();
        assert_eq!(after.pivot, chain.pivot);
        assert_eq!(after.node, chain.node);
        assert!(close(scene.orbit_angle(&scene.bodies()[0]), 1.25));
    }

    #[test]
    fn pivot_rotation_revolves_body() {
        let mut scene = SolarScene::new();
        let earth = scene.add_body(spec("Earth", 1.0, 12.0, 0.01, 0.01)).unwrap();
        scene.build_body(earth).unwrap();
        let chain = scene.bodies()[0].chain.clone().unwrap();

        assert!(close_v(
            scene.world_position(chain.node),
            Vec3::new(12.0, 0.0, 0.0)
        ));

        scene.node_mut(chain.pivot).transform.rot_y = PI / 2.0;
        assert!(close_v(
            scene.world_position(chain.node),
            Vec3::new(0.0, 0.0, -12.0)
        ));
    }

    #[test]
    fn spin_does_not_move_body_or_label() {
        let mut scene = SolarScene::new();
        let earth = scene.add_body(spec("Earth", 1.0, 12.0, 0.01, 0.01)).unwrap();
        scene.build_body(earth).unwrap();
        let chain = scene.bodies()[0].chain.clone().unwrap();
        let label = match &chain.decorations[0] {
            Decoration::Label { node, .. } => *node,
            other => panic!("expected label, got {:?}", other),
        };

        let body_before = scene.world_position(chain.node);
        let label_before = scene.world_position(label);

        scene.node_mut(chain.node).transform.rot_y = 2.3;

        assert!(close_v(scene.world_position(chain.node), body_before));
        assert!(
            close_v(scene.world_position(label), label_before),
            "label anchor sits on the spin axis and must not move with spin"
        );
        assert!(close_v(
            label_before.sub(body_before),
            Vec3::new(0.0, 1.0 + LABEL_MARGIN, 0.0)
        ));
    }

    #[test]
    fn ring_inherits_spin_not_orbit() {
        let mut scene = SolarScene::new();
        let mut s = spec("Saturn", 2.0, 27.0, 0.005, 0.006);
        s.decorations.push(DecorationSpec::Ring {
            inner: 2.5,
            outer: 4.5,
            tilt: PI / 2.5,
        });
        let saturn = scene.add_body(s).unwrap();
        scene.build_body(saturn).unwrap();
        let chain = scene.bodies()[0].chain.clone().unwrap();
        let ring = chain
            .decorations
            .iter()
            .find_map(|d| match d {
                Decoration::Ring { node, .. } => Some(*node),
                _ => None,
            })
            .unwrap();

        let sample = Vec3::new(3.5, 0.0, 0.0);
        let rel_at_rest = scene.world_point(ring, sample).sub(scene.world_position(chain.node));

        // spinning the body by theta carries the ring with it
        let theta = 0.8;
        scene.node_mut(chain.node).transform.rot_y = theta;
        let rel_spun = scene.world_point(ring, sample).sub(scene.world_position(chain.node));
        let (s_t, c_t) = theta.sin_cos();
        let expect = Vec3::new(
            c_t * rel_at_rest.x + s_t * rel_at_rest.z,
            rel_at_rest.y,
            -s_t * rel_at_rest.x + c_t * rel_at_rest.z,
        );
        assert!(close_v(rel_spun, expect));

        // revolving the pivot does not change the ring in the pivot frame
        let phi = 1.1;
        scene.node_mut(chain.pivot).transform.rot_y = phi;
        let rel_orbit = scene.world_point(ring, sample).sub(scene.world_position(chain.node));
        let (s_p, c_p) = (-phi).sin_cos();
        let back = Vec3::new(
            c_p * rel_orbit.x + s_p * rel_orbit.z,
            rel_orbit.y,
            -s_p * rel_orbit.x + c_p * rel_orbit.z,
        );
        assert!(
            close_v(back, rel_spun),
            "ring offset in the pivot frame must depend on spin only"
        );
    }

    #[test]
    fn creation_order_is_stable() {
        let mut scene = SolarScene::new();
        for id in ["c", "a", "b"] {
            scene.add_body(spec(id, 1.0, 10.0, 0.01, 0.01)).unwrap();
        }
        let order: Vec<&str> = scene.bodies().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }
}
