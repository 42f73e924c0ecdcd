use crate::fireflies::{Bounds, Swarm};
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use shroomling::feeding::FeedingInteraction;
use shroomling::gift::GiftInteraction;
use shroomling::model::{AgeStage, Evolution, FoodType, GamePhase, Meter, Millis};
use shroomling::pet::PetState;
use shroomling::session::SessionState;
use shroomling::tuning::Tuning;
use std::cmp::{max, min};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
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
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    fn set_i32(&mut self, x: i32, y: i32, c: Cell) {
        if x >= 0 && y >= 0 {
            self.set(x as u16, y as u16, c);
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
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
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
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
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        // force a full repaint on the next present
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
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
   Screen layout
------------------------------ */

const TRAY_SLOT_W: u16 = 15;

/// Where everything sits for a given terminal size. The left panel holds
/// text; the pet, fireflies and food tray share the right side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) panel_w: u16,
    pub(crate) pet_cx: i32,
    pub(crate) pet_cy: i32,
    pub(crate) tray_y: u16,
}

impl Layout {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        let panel_w = min(max(26, cols / 3), cols.saturating_sub(10));
        let pet_w = cols.saturating_sub(panel_w);
        Self {
            cols,
            rows,
            panel_w,
            pet_cx: panel_w as i32 + pet_w as i32 / 2,
            pet_cy: rows as i32 / 2 - 1,
            tray_y: rows.saturating_sub(3),
        }
    }

    pub(crate) fn mouth_row(&self) -> i32 {
        self.pet_cy + 1
    }

    pub(crate) fn tray_slot_x(&self, i: usize) -> u16 {
        self.panel_w + 2 + i as u16 * TRAY_SLOT_W
    }

    pub(crate) fn tray_slot_at(&self, col: u16, row: u16) -> Option<FoodType> {
        if row != self.tray_y {
            return None;
        }
        FoodType::ALL.iter().enumerate().find_map(|(i, food)| {
            let x0 = self.tray_slot_x(i);
            (col >= x0 && col < x0 + TRAY_SLOT_W - 1).then_some(*food)
        })
    }

    /// Rough box around the pet sprite, used for pokes.
    pub(crate) fn hits_pet(&self, col: u16, row: u16) -> bool {
        let (dx, dy) = (col as i32 - self.pet_cx, row as i32 - self.pet_cy);
        dx.abs() <= 7 && (-3..=3).contains(&dy)
    }

    pub(crate) fn swarm_bounds(&self) -> Bounds {
        Bounds {
            x: self.panel_w as f32 + 1.0,
            y: 1.0,
            w: self.cols.saturating_sub(self.panel_w + 2) as f32,
            h: self.tray_y.saturating_sub(2) as f32,
        }
    }
}

/// Everything a frame draws, borrowed from the world for the duration of one render.
pub(crate) struct View<'a> {
    pub(crate) pet: &'a PetState,
    pub(crate) session: &'a SessionState,
    pub(crate) feeding: &'a FeedingInteraction,
    pub(crate) gift: &'a GiftInteraction,
    pub(crate) tuning: &'a Tuning,
    pub(crate) now: Millis,
    pub(crate) color: bool,
}

impl View<'_> {
    fn tint(&self, c: Color) -> Color {
        if self.color {
            c
        } else {
            Color::White
        }
    }
}

/* -----------------------------
   UI overlay (text + meters)
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

fn meter_color(v: &View<'_>, value: f32) -> Color {
    let b = &v.tuning.behavior;
    if value >= b.hunger_threshold.min(b.thirst_threshold) {
        v.tint(Color::Red)
    } else if value >= v.tuning.neglect.dark_threshold {
        v.tint(Color::Yellow)
    } else {
        v.tint(Color::Green)
    }
}

fn fmt_secs(secs: f64) -> String {
    let s = secs.max(0.0) as u64;
    format!("{:02}:{:02}", s / 60, s % 60)
}

pub(crate) fn ui_overlay(buf: &mut CellBuffer, v: &View<'_>, layout: &Layout, help: &str) {
    let bg = Color::Black;
    let fg = Color::White;
    let pet = v.pet;

    let look = match pet.evolution() {
        Evolution::Normal => "calm",
        Evolution::Dark => "DARK",
    };
    let title = format!("Shroomling  |  stage {}  |  {look}", pet.stage().number());
    draw_text(buf, 1, 0, &title, fg, bg);

    let active = v.tuning.active_meters(pet.stage());
    let names = [
        (Meter::Hunger, "Hunger "),
        (Meter::Thirst, "Thirst "),
        (Meter::Boredom, "Boredom"),
    ];
    for (i, (meter, name)) in names.iter().enumerate() {
        let y = 2 + i as u16;
        if active.contains(*meter) {
            let val = pet.meter(*meter);
            let s = format!("{name} {} {:>3.0}", bar(val / 100.0, 12), val);
            draw_text(buf, 1, y, &s, meter_color(v, val), bg);
        } else {
            draw_text(buf, 1, y, &format!("{name} (not yet)"), Color::DarkGrey, bg);
        }
    }

    let counts = format!("Fed {}  Misted {}", pet.feed_count(), pet.mist_count());
    draw_text(buf, 1, 6, &counts, fg, bg);

    let clock = format!(
        "Alive {}  Best {}",
        fmt_secs(v.session.survival_time),
        fmt_secs(v.session.best_survival_time)
    );
    draw_text(buf, 1, 8, &clock, fg, bg);

    let jar = v.gift.jar();
    let jar_line = if jar.cooling_down {
        "Jar: resting".to_string()
    } else if v.gift.is_scooping() {
        format!("Jar: open, {} inside", jar.jar_count)
    } else if jar.jar_count > 0 {
        format!("Jar: closed, {} inside", jar.jar_count)
    } else {
        "Jar: closed".to_string()
    };
    draw_text(buf, 1, 10, &jar_line, v.tint(Color::Yellow), bg);

    if pet.is_irreversible_near(&v.tuning.neglect) {
        draw_text(buf, 1, 12, "Something is wrong...", v.tint(Color::Magenta), bg);
    }
    if v.session.paused && v.session.phase == GamePhase::Playing {
        draw_text(buf, 1, 13, "PAUSED", v.tint(Color::Cyan), bg);
    }

    draw_tray(buf, v, layout);
    draw_text(buf, 1, buf.h.saturating_sub(1), help, fg, bg);
}

fn draw_tray(buf: &mut CellBuffer, v: &View<'_>, layout: &Layout) {
    let bg = Color::Black;
    for (i, food) in FoodType::ALL.iter().enumerate() {
        let cooling = v.feeding.is_cooling_down(*food);
        let allowed = v.tuning.allows_food(v.pet.stage(), *food);
        let held = v.feeding.is_dragging() && v.feeding.drag().food_type == Some(*food);
        let fg = if held {
            v.tint(Color::Cyan)
        } else if cooling || !allowed {
            Color::DarkGrey
        } else {
            v.tint(Color::Yellow)
        };
        let label = format!("[{} {}]", i + 1, food.label());
        draw_text(buf, layout.tray_slot_x(i), layout.tray_y, &label, fg, bg);
    }

    let drag = v.feeding.drag();
    if drag.is_dragging {
        buf.set_i32(
            drag.drag_x as i32,
            drag.drag_y as i32,
            Cell {
                ch: '*',
                fg: v.tint(Color::Yellow),
                bg,
            },
        );
    }
}

pub(crate) fn draw_fireflies(buf: &mut CellBuffer, v: &View<'_>, swarm: &Swarm) {
    let dim = !v.gift.is_scooping();
    for f in &swarm.flies {
        let lit = f.phase.sin() > -0.2;
        let (ch, fg) = match (lit, dim) {
            (true, false) => ('*', v.tint(Color::Yellow)),
            (true, true) => ('·', v.tint(Color::DarkYellow)),
            (false, _) => ('.', Color::DarkGrey),
        };
        buf.set_i32(f.x as i32, f.y as i32, Cell { ch, fg, bg: Color::Black });
    }

    let jar = v.gift.jar();
    if v.gift.is_scooping() {
        let ch = if jar.pressing { 'U' } else { 'u' };
        buf.set_i32(
            jar.drag_x as i32,
            jar.drag_y as i32,
            Cell {
                ch,
                fg: v.tint(Color::Cyan),
                bg: Color::Black,
            },
        );
    }
}

/* -----------------------------
   Pet sprite
------------------------------ */

pub(crate) fn draw_pet_ascii(buf: &mut CellBuffer, v: &View<'_>, cx: i32, cy: i32) {
    let bg = Color::Black;
    let pet = v.pet;
    let dark = pet.evolution() == Evolution::Dark;
    let behavior = &v.tuning.behavior;
    let active = v.tuning.active_meters(pet.stage());
    let unhappy = Meter::ALL
        .iter()
        .any(|m| active.contains(*m) && pet.meter(*m) >= behavior.hunger_threshold);

    // eyes brighten for a moment after any interaction
    let recent = pet
        .last_reaction()
        .is_some_and(|(_, at)| v.now.since(at) < 1_200);
    let eyes = match (dark, unhappy, recent) {
        (true, _, _) => "> <",
        (false, _, true) => "^ ^",
        (false, true, false) => "u u",
        (false, false, false) => "o o",
    };

    let mut grid: Vec<String> = match pet.stage() {
        AgeStage::One => vec![
            "   .-.   ".into(),
            format!("  ({eyes})  "),
            "   |_|   ".into(),
        ],
        AgeStage::Two | AgeStage::Three => vec![
            "    .-~~~~~-.    ".into(),
            "  .'  .   .  '.  ".into(),
            format!(" (_____{eyes}_____) "),
            "      |   |      ".into(),
            "      |___|      ".into(),
        ],
    };
    if pet.stage() == AgeStage::Three {
        grid[1] = "  .' o  .  o  '. ".into();
    }

    let cap = match (dark, pet.stage()) {
        (true, _) => Color::DarkMagenta,
        (false, AgeStage::One) => Color::DarkYellow,
        (false, _) => Color::Red,
    };

    let h = grid.len() as i32;
    let y0 = cy - h / 2;
    for (yy, line) in grid.iter().enumerate() {
        let w = line.chars().count() as i32;
        let mut x = cx - w / 2;
        let stem = yy as i32 >= h - 2 && h > 3;
        let fg = if stem { v.tint(Color::White) } else { v.tint(cap) };
        for ch in line.chars() {
            if ch != ' ' {
                buf.set_i32(x, y0 + yy as i32, Cell { ch, fg, bg });
            }
            x += 1;
        }
    }

    if unhappy && !dark {
        buf.set_i32(
            cx,
            y0 - 2,
            Cell {
                ch: '!',
                fg: v.tint(Color::Red),
                bg,
            },
        );
    }
}

/// Speech bubble above the pet for the last message, while it is fresh.
pub(crate) fn draw_speech(buf: &mut CellBuffer, v: &View<'_>, cx: i32, cy: i32) {
    let Some((text, at)) = v.pet.last_message() else {
        return;
    };
    if v.now.since(at) >= v.tuning.timing.speech_bubble_ms {
        return;
    }
    let fg = match v.pet.evolution() {
        Evolution::Normal => v.tint(Color::White),
        Evolution::Dark => v.tint(Color::Magenta),
    };
    let quoted = format!("\"{text}\"");
    let w = quoted.chars().count() as i32;
    let x = (cx - w / 2).max(0);
    let y = cy - 6;
    if y >= 0 {
        draw_text(buf, x as u16, y as u16, &quoted, fg, Color::Black);
    }
}

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let w = buf.w;
    let h = buf.h;
    let bw = min(52, w.saturating_sub(4));
    let bh = min(14, h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;

    let edge = |ch| Cell {
        ch,
        fg: Color::White,
        bg: Color::Black,
    };
    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            buf.set(x, y, Cell::default());
        }
    }
    for x in x0..x0 + bw {
        buf.set(x, y0, edge('─'));
        buf.set(x, y0 + bh - 1, edge('─'));
    }
    for y in y0..y0 + bh {
        buf.set(x0, y, edge('│'));
        buf.set(x0 + bw - 1, y, edge('│'));
    }
    buf.set(x0, y0, edge('┌'));
    buf.set(x0 + bw - 1, y0, edge('┐'));
    buf.set(x0, y0 + bh - 1, edge('└'));
    buf.set(x0 + bw - 1, y0 + bh - 1, edge('┘'));

    draw_text(buf, x0 + 2, y0 + 1, title, Color::White, Color::Black);
    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, Color::White, Color::Black);
        yy += 1;
    }
}
