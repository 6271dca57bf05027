use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ViewAction {
    Quit,
    TogglePause,
    ToggleLabels,
    ToggleOrbits,
    Yaw(f32),
    Pitch(f32),
    Zoom(f32),
    ResetView,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<KeyCode>> {
    let mut out = Vec::new();
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                out.push(k.code);
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_key_to_action(key: KeyCode) -> Option<ViewAction> {
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(ViewAction::Quit),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => {
            Some(ViewAction::TogglePause)
        }
        KeyCode::Char('l') | KeyCode::Char('L') => Some(ViewAction::ToggleLabels),
        KeyCode::Char('o') | KeyCode::Char('O') => Some(ViewAction::ToggleOrbits),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(ViewAction::Yaw(-0.08)),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(ViewAction::Yaw(0.08)),
        KeyCode::Up => Some(ViewAction::Pitch(0.06)),
        KeyCode::Down => Some(ViewAction::Pitch(-0.06)),
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Char('+') | KeyCode::Char('=') => {
            Some(ViewAction::Zoom(1.0 / 1.1))
        }
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('-') => {
            Some(ViewAction::Zoom(1.1))
        }
        KeyCode::Char('r') | KeyCode::Char('R') => Some(ViewAction::ResetView),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_map_covers_the_basics() {
        assert_eq!(map_key_to_action(KeyCode::Char('q')), Some(ViewAction::Quit));
        assert_eq!(
            map_key_to_action(KeyCode::Char(' ')),
            Some(ViewAction::TogglePause)
        );
        assert_eq!(
            map_key_to_action(KeyCode::Char('l')),
            Some(ViewAction::ToggleLabels)
        );
        assert_eq!(map_key_to_action(KeyCode::Char('x')), None);
        assert!(matches!(
            map_key_to_action(KeyCode::Left),
            Some(ViewAction::Yaw(d)) if d < 0.0
        ));
        assert!(matches!(
            map_key_to_action(KeyCode::Char('w')),
            Some(ViewAction::Zoom(f)) if f < 1.0
        ));
    }
}
