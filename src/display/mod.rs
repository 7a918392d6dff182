// Display module - frame presentation
//
// `palette` holds the fixed 64-entry NTSC master palette, `framebuffer`
// the RGBA staging buffer, and `window` the winit/pixels shell that blits
// finished frames to the screen.

pub mod framebuffer;
pub mod palette;
pub mod window;

pub use framebuffer::{FrameBuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use window::{run_window, WindowConfig};
