use crate::app::Scene;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use shroomling::model::FoodType;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PointerKind {
    Down,
    Drag,
    Up,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Pointer { kind: PointerKind, col: u16, row: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HostAction {
    Quit,
    HelpToggle,
    Back,
    /// Keyboard shortcut: throw straight at the pet.
    Throw(FoodType),
    Mist,
    ToggleJar,
    TogglePause,
    Restart,
    CancelDrag,
    Pointer(PointerKind, u16, u16),
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) => {
                let kind = match m.kind {
                    MouseEventKind::Down(MouseButton::Left) => PointerKind::Down,
                    MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                        PointerKind::Drag
                    }
                    MouseEventKind::Up(MouseButton::Left) => PointerKind::Up,
                    _ => continue,
                };
                out.push(InputEvent::Pointer {
                    kind,
                    col: m.column,
                    row: m.row,
                });
            }
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(scene: Scene, ev: InputEvent) -> Option<HostAction> {
    let (key, mods) = match ev {
        InputEvent::Pointer { kind, col, row } => {
            return (scene == Scene::Main).then_some(HostAction::Pointer(kind, col, row));
        }
        InputEvent::Key { key, mods } => (key, mods),
    };

    if matches!(key, KeyCode::Char('c')) && mods.contains(KeyModifiers::CONTROL) {
        return Some(HostAction::Quit);
    }
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(HostAction::Quit),
        KeyCode::Char('h') | KeyCode::Char('H') => return Some(HostAction::HelpToggle),
        _ => {}
    }

    match scene {
        Scene::Main => match key {
            KeyCode::Char('1') => Some(HostAction::Throw(FoodType::BarkChip)),
            KeyCode::Char('2') => Some(HostAction::Throw(FoodType::DeadLeaf)),
            KeyCode::Char('3') => Some(HostAction::Throw(FoodType::RottenLog)),
            KeyCode::Char('4') => Some(HostAction::Throw(FoodType::Compost)),
            KeyCode::Char('m') | KeyCode::Char('M') => Some(HostAction::Mist),
            KeyCode::Char('j') | KeyCode::Char('J') => Some(HostAction::ToggleJar),
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                Some(HostAction::TogglePause)
            }
            KeyCode::Char('r') | KeyCode::Char('R') => Some(HostAction::Restart),
            KeyCode::Esc => Some(HostAction::CancelDrag),
            _ => None,
        },
        Scene::Help => match key {
            KeyCode::Esc => Some(HostAction::Back),
            _ => None,
        },
        Scene::GameOver => match key {
            KeyCode::Char('r') | KeyCode::Char('R') | KeyCode::Char('n') | KeyCode::Char('N') => {
                Some(HostAction::Restart)
            }
            _ => None,
        },
    }
}
