use winit::event::{ElementState, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};

/// Latest pointer, button and quit state, folded from window events. The
/// render loop reads it once per tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputState {
    // Window pixels. None until the cursor first moves over the window.
    pub pointer: Option<[f64; 2]>,
    pub window_size: [u32; 2],
    pub primary_button: bool,
    // Latched: once requested, quitting cannot be taken back.
    pub quit: bool,
}

impl InputState {
    pub fn new(window_size: [u32; 2]) -> Self {
        InputState {
            pointer: None,
            window_size,
            primary_button: false,
            quit: false,
        }
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer = Some([position.x, position.y]);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.primary_button = *state == ElementState::Pressed;
            }
            WindowEvent::KeyboardInput {
                input:
                    KeyboardInput {
                        virtual_keycode: Some(VirtualKeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                log::info!("Quit requested");
                self.quit = true;
            }
            WindowEvent::Resized(size) => {
                self.window_size = [size.width, size.height];
            }
            WindowEvent::Focused(false) => {
                // Button releases outside the window are never delivered.
                self.primary_button = false;
            }
            _ => (),
        }
    }

    /// Pointer in [-1, 1] on both axes. Before any cursor motion the pointer
    /// counts as centred.
    pub fn normalized_pointer(&self) -> [f32; 2] {
        match self.pointer {
            Some(pointer) => crate::simulation::normalize_pointer(pointer, self.window_size),
            None => [0.0, 0.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn starts_centred_and_idle() {
        let input = InputState::new([800, 600]);
        assert_eq!(input.normalized_pointer(), [0.0, 0.0]);
        assert!(!input.primary_button);
        assert!(!input.quit);
    }

    #[test]
    fn pointer_uses_current_window_size() {
        let mut input = InputState::new([800, 600]);
        input.pointer = Some([200.0, 300.0]);
        assert_eq!(input.normalized_pointer(), [0.5, 0.0]);
        input.handle_event(&WindowEvent::Resized(PhysicalSize::new(400, 600)));
        assert_eq!(input.window_size, [400, 600]);
        assert_eq!(input.normalized_pointer(), [0.0, 0.0]);
    }

    #[test]
    fn close_request_latches_quit() {
        let mut input = InputState::new([800, 600]);
        input.handle_event(&WindowEvent::CloseRequested);
        assert!(input.quit);
        input.handle_event(&WindowEvent::Focused(true));
        assert!(input.quit);
    }

    #[allow(deprecated)]
    fn key(keycode: VirtualKeyCode, state: ElementState) -> WindowEvent<'static> {
        WindowEvent::KeyboardInput {
            device_id: unsafe { winit::event::DeviceId::dummy() },
            input: KeyboardInput {
                scancode: 0,
                state,
                virtual_keycode: Some(keycode),
                modifiers: Default::default(),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn escape_press_quits() {
        let mut input = InputState::new([800, 600]);
        input.handle_event(&key(VirtualKeyCode::Space, ElementState::Pressed));
        input.handle_event(&key(VirtualKeyCode::Escape, ElementState::Released));
        assert!(!input.quit);
        input.handle_event(&key(VirtualKeyCode::Escape, ElementState::Pressed));
        assert!(input.quit);
    }

    #[test]
    fn losing_focus_releases_button() {
        let mut input = InputState::new([800, 600]);
        input.primary_button = true;
        input.handle_event(&WindowEvent::Focused(false));
        assert!(!input.primary_button);
    }
}
