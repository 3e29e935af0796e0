//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` actions. Overlays (help, text input,
//! confirmations) take every key while they are open.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{can_add_path_char, can_add_registration_char, App, AppState, View};

/// Which text field an input overlay is editing
#[derive(Clone, Copy)]
enum InputField {
    Registration,
    ImagePath,
}

/// Handle keyboard input. Returns true if the app should quit.
///
/// Lookups started from here run on spawned tasks, so this never waits on
/// the network.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingRemove => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.confirm_remove_vehicle();
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::AddingVehicle => {
            handle_text_input(app, key, InputField::Registration);
            return Ok(false);
        }
        AppState::AttachingImage => {
            handle_text_input(app, key, InputField::ImagePath);
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        _ => {}
    }

    match app.view {
        View::Garage => handle_garage_input(app, key),
        View::Detail => handle_detail_input(app, key),
    }

    Ok(false)
}

fn handle_text_input(app: &mut App, key: KeyEvent, field: InputField) {
    match key.code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => match field {
            InputField::Registration => app.submit_add(),
            InputField::ImagePath => app.submit_attach_image(),
        },
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => {
            let len = app.input.chars().count();
            let accepted = match field {
                InputField::Registration => can_add_registration_char(len, c),
                InputField::ImagePath => can_add_path_char(len, c),
            };
            if accepted {
                app.input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_garage_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Char('a') => app.start_add(),
        KeyCode::Char('s') => app.toggle_select(),
        KeyCode::Char('x') | KeyCode::Delete => app.remove_at_cursor(),
        KeyCode::Char('v') => app.start_validation(),
        KeyCode::Enter => app.open_detail(),
        _ => {}
    }
}

fn handle_detail_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Backspace => app.close_detail(),
        KeyCode::Char('r') => app.refresh_detail(),
        KeyCode::Char('i') => app.start_attach_image(),
        KeyCode::Char('d') => app.remove_image(),
        KeyCode::Char('x') | KeyCode::Delete => app.start_remove_vehicle(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crossterm::event::KeyModifiers;
    use garage_core::{ApiClient, Config, RecordStore};

    fn test_app() -> App {
        let api = ApiClient::new("http://127.0.0.1:1/vehicles", None, Duration::from_secs(1))
            .expect("Failed to build client");
        App::with_parts(Config::default(), RecordStore::in_memory(), api)
            .expect("Failed to build app")
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_quit_needs_confirmation() {
        let mut app = test_app();

        assert!(!handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap());
        assert_eq!(app.state, AppState::ConfirmingQuit);

        assert!(!handle_input(&mut app, press(KeyCode::Char('n'))).await.unwrap());
        assert_eq!(app.state, AppState::Normal);

        handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert!(handle_input(&mut app, press(KeyCode::Char('y'))).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = test_app();
        handle_input(&mut app, press(KeyCode::Char('?'))).await.unwrap();
        assert_eq!(app.state, AppState::ShowingHelp);

        // 'x' would remove a vehicle in the list
        handle_input(&mut app, press(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.collection.len(), 4);

        handle_input(&mut app, press(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
    }

    #[tokio::test]
    async fn test_typing_registration() {
        let mut app = test_app();
        handle_input(&mut app, press(KeyCode::Char('a'))).await.unwrap();
        assert_eq!(app.state, AppState::AddingVehicle);

        for c in "SW03PERX".chars() {
            handle_input(&mut app, press(KeyCode::Char(c))).await.unwrap();
        }
        handle_input(&mut app, press(KeyCode::Backspace)).await.unwrap();
        // 'q' is text here, not quit
        handle_input(&mut app, press(KeyCode::Char('q'))).await.unwrap();
        assert_eq!(app.input, "SW03PERq");
        assert_eq!(app.state, AppState::AddingVehicle);

        handle_input(&mut app, press(KeyCode::Esc)).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.input.is_empty());
    }

    #[tokio::test]
    async fn test_garage_navigation_and_select() {
        let mut app = test_app();
        handle_input(&mut app, press(KeyCode::Down)).await.unwrap();
        handle_input(&mut app, press(KeyCode::Down)).await.unwrap();
        handle_input(&mut app, press(KeyCode::Up)).await.unwrap();
        assert_eq!(app.cursor, 1);

        handle_input(&mut app, press(KeyCode::Char('s'))).await.unwrap();
        assert_eq!(app.collection.selected_id(), Some(2));

        handle_input(&mut app, press(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.collection.len(), 3);
        assert_eq!(app.collection.selected_id(), None);
    }

    #[tokio::test]
    async fn test_detail_remove_asks_first() {
        let mut app = test_app();
        app.store
            .save_detail("ABC123", garage_core::VehicleDetailRecord::new("ABC123", "ROVER"))
            .unwrap();

        handle_input(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.view, View::Detail);

        handle_input(&mut app, press(KeyCode::Char('x'))).await.unwrap();
        assert_eq!(app.state, AppState::ConfirmingRemove);
        handle_input(&mut app, press(KeyCode::Char('n'))).await.unwrap();
        assert_eq!(app.collection.len(), 4);

        handle_input(&mut app, press(KeyCode::Char('x'))).await.unwrap();
        handle_input(&mut app, press(KeyCode::Char('y'))).await.unwrap();
        assert_eq!(app.collection.len(), 3);
        assert_eq!(app.view, View::Garage);
    }
}
