// Window shell - winit event loop plus a pixels surface
//
// Runs the emulator at frame granularity: each redraw steps one frame,
// blits it, and forwards the frame's audio to the output stream. Keyboard
// state is pushed into the controller port before every frame.

use crate::audio::AudioOutput;
use crate::display::framebuffer::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::emulator::Emulator;
use crate::input::Button;
use anyhow::Context;
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// NTSC frame period
const FRAME_DURATION: Duration = Duration::from_nanos(16_639_267);

/// Presentation settings
#[derive(Debug, Clone, Copy)]
pub struct WindowConfig {
    /// Integer scale factor, clamped to 1-8
    pub scale: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            scale: 3,
            vsync: true,
        }
    }
}

/// Run the emulator under a window until the user quits
pub fn run_window(
    emulator: Emulator,
    config: WindowConfig,
    audio: Option<AudioOutput>,
) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        emulator,
        config,
        audio,
        window: None,
        pixels: None,
        frame: FrameBuffer::new(),
        samples: Vec::new(),
        next_frame: Instant::now(),
        save_slot: 0,
    };
    event_loop.run_app(&mut app).context("running event loop")?;
    Ok(())
}

struct App {
    emulator: Emulator,
    config: WindowConfig,
    audio: Option<AudioOutput>,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    frame: FrameBuffer,
    samples: Vec<f32>,
    next_frame: Instant,
    /// Save-state slot F5/F9 act on; F7 cycles it through 0-9
    save_slot: u8,
}

impl App {
    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;

        // Hotkeys act on the press edge only
        if pressed && !event.repeat {
            match code {
                KeyCode::Escape => {
                    event_loop.exit();
                    return;
                }
                KeyCode::KeyR => {
                    self.emulator.reset();
                    return;
                }
                KeyCode::KeyP => {
                    self.emulator.toggle_pause();
                    return;
                }
                KeyCode::F5 => {
                    match self.emulator.save_state_to_slot(self.save_slot) {
                        Ok(()) => log::info!("saved state to slot {}", self.save_slot),
                        Err(e) => log::warn!("save state failed: {}", e),
                    }
                    return;
                }
                KeyCode::F7 => {
                    self.save_slot = (self.save_slot + 1) % 10;
                    log::info!("save slot: {}", self.save_slot);
                    return;
                }
                KeyCode::F9 => {
                    match self.emulator.load_state_from_slot(self.save_slot) {
                        Ok(()) => log::info!("loaded state from slot {}", self.save_slot),
                        Err(e) => log::warn!("load state failed: {}", e),
                    }
                    return;
                }
                _ => {}
            }
        }

        let button = match code {
            KeyCode::KeyZ => Button::A,
            KeyCode::KeyX => Button::B,
            KeyCode::Tab => Button::Select,
            KeyCode::Enter => Button::Start,
            KeyCode::ArrowUp => Button::Up,
            KeyCode::ArrowDown => Button::Down,
            KeyCode::ArrowLeft => Button::Left,
            KeyCode::ArrowRight => Button::Right,
            _ => return,
        };
        self.emulator
            .bus_mut()
            .input_mut()
            .set_button(0, button, pressed);
    }

    fn run_frame(&mut self) {
        if !self.emulator.is_paused() {
            self.emulator.step_frame();

            self.samples.clear();
            self.emulator.take_audio_samples(&mut self.samples);
            if let Some(audio) = &self.audio {
                audio.push_samples(&self.samples);
            }
        }

        self.frame.update_from(self.emulator.bus().ppu());
        if let Some(pixels) = &mut self.pixels {
            self.frame.blit(pixels.frame_mut());
            if let Err(e) = pixels.render() {
                log::warn!("render failed: {}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let scale = self.config.scale.clamp(1, 8);
        let size = LogicalSize::new(SCREEN_WIDTH * scale, SCREEN_HEIGHT * scale);
        let attributes = Window::default_attributes()
            .with_title("famicore")
            .with_inner_size(size)
            .with_min_inner_size(LogicalSize::new(SCREEN_WIDTH, SCREEN_HEIGHT));

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("window creation failed: {}", e);
                event_loop.exit();
                return;
            }
        };

        let physical = window.inner_size();
        let surface = SurfaceTexture::new(physical.width, physical.height, window.clone());
        let pixels = PixelsBuilder::new(SCREEN_WIDTH, SCREEN_HEIGHT, surface)
            .enable_vsync(self.config.vsync)
            .build();
        match pixels {
            Ok(pixels) => self.pixels = Some(pixels),
            Err(e) => {
                log::error!("pixel surface creation failed: {}", e);
                event_loop.exit();
                return;
            }
        }

        self.window = Some(window);
        self.next_frame = Instant::now();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if let Err(e) = self.emulator.save_battery_ram() {
                    log::warn!("battery save failed: {}", e);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(pixels) = &mut self.pixels {
                    if pixels.resize_surface(size.width, size.height).is_err() {
                        log::warn!("surface resize failed");
                    }
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::RedrawRequested => {
                self.run_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Pace to ~60Hz without vsync; with vsync the present blocks
        let now = Instant::now();
        if now >= self.next_frame {
            self.next_frame = now + FRAME_DURATION;
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }
    }
}
