use crate::fireflies::Swarm;
use crate::input::{collect_input_nonblocking, map_event_to_action, HostAction, PointerKind};
use crate::render::{
    draw_center_box, draw_fireflies, draw_pet_ascii, draw_speech, ui_overlay, Layout, Terminal,
    View,
};
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shroomling::config::{
    load_settings, load_tuning, save_settings_atomic, DevMode, Paths, Settings,
};
use shroomling::model::{FoodType, GamePhase, Millis, Viewport};
use shroomling::storage::FileRecordStore;
use shroomling::timer::MonotonicClock;
use shroomling::world::{PokeResult, Vec3, World, WorldProjection};
use std::time::{Duration, Instant};
use tracing::{debug, info};

// one world unit spans this many columns
const CELLS_PER_UNIT: f32 = 4.0;
// pointer pixels per terminal cell, for the jar's catch radius
const PX_PER_CELL: f32 = 16.0;
const FIREFLY_COUNT: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Scene {
    Main,
    Help,
    GameOver,
}

/// Maps terminal cells into the pet's space: the origin sits on the mouth,
/// rows count double because cells are tall.
struct CellProjection {
    layout: Layout,
    depth: f32,
}

impl WorldProjection for CellProjection {
    fn to_world(&self, nx: f32, ny: f32, depth: f32) -> Vec3 {
        let col = nx * self.layout.cols as f32;
        let row = ny * self.layout.rows as f32;
        Vec3::new(
            (col - self.layout.pet_cx as f32 - 0.5) / CELLS_PER_UNIT,
            (self.layout.mouth_row() as f32 + 0.5 - row) * 2.0 / CELLS_PER_UNIT,
            depth,
        )
    }

    fn mouth_anchor(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.depth)
    }
}

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    world: World<StdRng>,
    swarm: Swarm,
    swarm_rng: StdRng,
    clock: MonotonicClock,
    term: Terminal,
    help_open: bool,
    pointer: Option<(u16, u16)>,
    should_quit: bool,
}

impl App {
    fn init(paths: Paths) -> anyhow::Result<Self> {
        let mut settings = load_settings(&paths.settings_path);
        let mut tuning = load_tuning(&paths.tuning_path);

        let dev_mode = DevMode::from_env().unwrap_or(settings.dev_mode);
        dev_mode.apply(&mut tuning);

        // ensure deterministic seed exists
        if settings.seed == 0 {
            settings.seed = Settings::default().seed;
        }

        let store = FileRecordStore::new(&paths.records_path);
        let world = World::new(tuning, Box::new(store), StdRng::seed_from_u64(settings.seed));

        let term = Terminal::begin().context("entering the alternate screen")?;
        let layout = Layout::new(term.cols, term.rows);
        let mut swarm_rng = StdRng::seed_from_u64(settings.seed.rotate_left(17));
        let swarm = Swarm::new(FIREFLY_COUNT, layout.swarm_bounds(), &mut swarm_rng);

        info!(?dev_mode, seed = settings.seed, "started");
        Ok(Self {
            settings,
            paths,
            world,
            swarm,
            swarm_rng,
            clock: MonotonicClock::start(),
            term,
            help_open: false,
            pointer: None,
            should_quit: false,
        })
    }

    fn layout(&self) -> Layout {
        Layout::new(self.term.cols, self.term.rows)
    }

    fn scene(&self) -> Scene {
        if self.world.session().phase == GamePhase::GameOver {
            Scene::GameOver
        } else if self.help_open {
            Scene::Help
        } else {
            Scene::Main
        }
    }

    fn projection(&self) -> CellProjection {
        CellProjection {
            layout: self.layout(),
            depth: self.world.tuning().throw.drag_depth,
        }
    }

    fn viewport(&self) -> Viewport {
        Viewport::new(self.term.cols as f32, self.term.rows as f32)
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();
            self.term.resize_if_needed()?;

            // input
            let events = collect_input_nonblocking(frame_dt)?;
            for ev in events {
                if let Some(action) = map_event_to_action(self.scene(), ev) {
                    self.apply(action);
                }
                if self.should_quit {
                    break;
                }
            }

            // sim
            let dt = frame_start.saturating_duration_since(last_frame).as_secs_f32();
            last_frame = frame_start;
            let now = self.clock.now();
            let projection = self.projection();
            let report = self.world.frame(dt, now, &projection);
            if let Some(outcome) = report.drop {
                debug!(?outcome, "throw");
            }
            if self.world.is_running() {
                let bounds = self.layout().swarm_bounds();
                self.swarm.step(dt.min(0.1), bounds, &mut self.swarm_rng);
            }

            // render
            self.render_frame(now)?;

            // frame cap
            spin_sleep(frame_dt, frame_start);
        }

        self.term.end()?;
        save_settings_atomic(&self.paths.settings_path, &self.settings)?;
        Ok(())
    }

    fn apply(&mut self, action: HostAction) {
        let now = self.clock.now();
        match action {
            HostAction::Quit => self.should_quit = true,
            HostAction::HelpToggle => self.help_open = !self.help_open,
            HostAction::Back => self.help_open = false,
            HostAction::Throw(food) => self.throw_at_pet(food),
            HostAction::Mist => {
                self.world.mist(now);
            }
            HostAction::ToggleJar => {
                let anchor = self.pointer.map(|(c, r)| (c as f32, r as f32));
                self.world.toggle_jar(anchor);
            }
            HostAction::TogglePause => self.world.toggle_pause(),
            HostAction::Restart => {
                self.world.restart();
                self.help_open = false;
            }
            HostAction::CancelDrag => self.world.cancel_drag(),
            HostAction::Pointer(kind, col, row) => self.pointer_event(kind, col, row, now),
        }
    }

    // Keyboard throw: a drag from the tray straight onto the mouth.
    fn throw_at_pet(&mut self, food: FoodType) {
        let layout = self.layout();
        let slot = FoodType::ALL.iter().position(|f| *f == food).unwrap_or(0);
        self.world
            .start_drag(food, layout.tray_slot_x(slot) as f32, layout.tray_y as f32);
        self.world
            .pointer_moved(layout.pet_cx as f32 + 0.5, layout.mouth_row() as f32 + 0.5);
        let viewport = self.viewport();
        self.world.release(viewport);
    }

    fn pointer_event(&mut self, kind: PointerKind, col: u16, row: u16, now: Millis) {
        self.pointer = Some((col, row));
        let (x, y) = (col as f32 + 0.5, row as f32 + 0.5);
        let layout = self.layout();
        match kind {
            PointerKind::Down => {
                if layout.hits_pet(col, row) {
                    match self.world.poke(now) {
                        PokeResult::Gift(n) => info!(fireflies = n, "gift delivered"),
                        PokeResult::Said(u) => debug!(cue = ?u.cue, "poked"),
                        PokeResult::Ignored => {}
                    }
                } else if self.world.gift().is_scooping() {
                    self.world.press(x, y);
                    self.scoop_at(x, y);
                } else if let Some(food) = layout.tray_slot_at(col, row) {
                    self.world.start_drag(food, x, y);
                }
            }
            PointerKind::Drag => {
                self.world.pointer_moved(x, y);
                if self.world.gift().is_pressing() {
                    self.scoop_at(x, y);
                }
            }
            PointerKind::Up => {
                let viewport = self.viewport();
                self.world.pointer_moved(x, y);
                self.world.release(viewport);
            }
        }
    }

    fn scoop_at(&mut self, x: f32, y: f32) {
        let radius = self.world.tuning().jar.catch_radius_px / PX_PER_CELL;
        let bounds = self.layout().swarm_bounds();
        let caught = self
            .swarm
            .catch_near(x, y, radius, bounds, &mut self.swarm_rng);
        for _ in 0..caught {
            self.world.catch_firefly();
        }
    }

    fn render_frame(&mut self, now: Millis) -> anyhow::Result<()> {
        let layout = self.layout();
        let scene = self.scene();
        let help = match scene {
            Scene::Main => "q quit | 1-4 feed | m mist | j jar | click pet poke | space pause | r restart | h help",
            Scene::Help => "Help: esc back | h close | q quit",
            Scene::GameOver => "Game over: r new run | q quit",
        };

        let view = View {
            pet: self.world.pet(),
            session: self.world.session(),
            feeding: self.world.feeding(),
            gift: self.world.gift(),
            tuning: self.world.tuning(),
            now,
            color: self.settings.enable_color,
        };

        let buf = &mut self.term.cur;
        buf.clear(crossterm::style::Color::Black);
        draw_fireflies(buf, &view, &self.swarm);
        draw_pet_ascii(buf, &view, layout.pet_cx, layout.pet_cy);
        draw_speech(buf, &view, layout.pet_cx, layout.pet_cy);
        ui_overlay(buf, &view, &layout, help);

        match scene {
            Scene::Help => draw_center_box(
                buf,
                "How to play",
                "Keep the mushroom fed, misted and entertained.\n\
                 Drag food from the tray onto its mouth (or 1-4).\n\
                 M mists. J opens the firefly jar: hold the mouse\n\
                 button and sweep through fireflies, then click\n\
                 the mushroom to hand them over.\n\n\
                 Neglect turns it dark. Leave a need maxed out\n\
                 for too long and the run ends.\n\n\
                 Esc or H to close help.",
            ),
            Scene::GameOver => {
                let s = view.session;
                let body = format!(
                    "Survived {:.0}s\nBest {:.0}s\n\nPress R for a new run, or Q to quit.",
                    s.survival_time, s.best_survival_time
                );
                draw_center_box(buf, "Your shroomling withered away.", &body);
            }
            Scene::Main => {}
        }

        self.term.present(true)?;
        Ok(())
    }
}

pub(crate) fn run(paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(paths)?;
    app.run()?;
    Ok(())
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouth_cell_projects_onto_the_anchor() {
        let layout = Layout::new(120, 40);
        let p = CellProjection { layout, depth: 2.5 };
        let nx = (layout.pet_cx as f32 + 0.5) / 120.0;
        let ny = (layout.mouth_row() as f32 + 0.5) / 40.0;
        let point = p.to_world(nx, ny, 2.5);
        assert!(point.distance(p.mouth_anchor()) < 1e-3);

        // far corner is well outside the hit radius
        let corner = p.to_world(0.0, 0.0, 2.5);
        assert!(corner.distance(p.mouth_anchor()) > 5.0);
    }
}
