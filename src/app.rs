use crate::assets::AssetServer;
use crate::camera::Camera;
use crate::config::{load_settings, project_paths, save_settings_atomic, Paths, Settings};
use crate::input::{collect_input_nonblocking, map_key_to_action, ViewAction};
use crate::model::default_system;
use crate::render::{build_star_field, render_overlay, render_scene, HudState, Star, Terminal};
use crate::scene::SolarScene;
use crate::sim::Clock;
use crossterm::style::Color;
use std::time::{Duration, Instant};

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    scene: SolarScene,
    clock: Clock,
    camera: Camera,
    assets: AssetServer,
    stars: Vec<Star>,
    term: Terminal,
    paused: bool,
    should_quit: bool,
    started: Instant,
}

impl App {
    fn init() -> anyhow::Result<Self> {
        let paths = project_paths()?;
        let settings = load_settings(&paths.settings_path);

        // build the whole system once; everything lives for the process
        let mut scene = SolarScene::new();
        let (sun, planets) = default_system();
        scene.set_central(sun)?;
        let mut names = Vec::new();
        for spec in planets {
            names.push(spec.id.clone());
            let idx = scene.add_body(spec)?;
            scene.build_body(idx)?;
        }
        if let Some(c) = scene.central() {
            names.push(c.id.clone());
        }

        let assets = AssetServer::spawn(paths.themes_dir.clone(), &names);
        let stars = build_star_field(
            settings.star_count,
            settings.star_spread,
            settings.star_seed,
        );

        let term = Terminal::begin()?;

        Ok(Self {
            settings,
            paths,
            scene,
            clock: Clock::new(),
            camera: Camera::new(),
            assets,
            stars,
            term,
            paused: false,
            should_quit: false,
            started: Instant::now(),
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        while !self.should_quit {
            self.term.resize_if_needed()?;

            for key in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_key_to_action(key) {
                    self.apply(action);
                }
            }

            self.assets.poll();

            // the update for every body finishes before any drawing below
            if !self.paused {
                self.clock.tick(&mut self.scene);
            }

            self.render_frame()?;
            spin_sleep(frame_dt, Instant::now());
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn apply(&mut self, action: ViewAction) {
        match action {
            ViewAction::Quit => self.should_quit = true,
            ViewAction::TogglePause => self.paused = !self.paused,
            ViewAction::ToggleLabels => self.settings.show_labels = !self.settings.show_labels,
            ViewAction::ToggleOrbits => self.settings.show_orbits = !self.settings.show_orbits,
            ViewAction::Yaw(d) => self.camera.add_yaw(d),
            ViewAction::Pitch(d) => self.camera.add_pitch(d),
            ViewAction::Zoom(f) => self.camera.zoom(f),
            ViewAction::ResetView => self.camera.reset(),
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        self.term.cur.clear(Color::Black);

        // one camera snapshot for both passes, so labels stay glued to bodies
        let cam = self.camera;
        let t = self.started.elapsed().as_secs_f32();

        render_scene(
            &mut self.term.cur,
            &self.scene,
            &cam,
            &self.assets,
            &self.stars,
            t,
            self.settings.show_orbits,
        );
        render_overlay(
            &mut self.term.cur,
            &self.scene,
            &cam,
            &self.assets,
            &HudState {
                paused: self.paused,
                ticks: self.clock.ticks(),
                show_labels: self.settings.show_labels,
                show_orbits: self.settings.show_orbits,
            },
        );

        self.term.present()?;
        Ok(())
    }
}

pub(crate) fn run() -> anyhow::Result<()> {
    let mut app = App::init()?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
