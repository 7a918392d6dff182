//! Shared counter/divider units wired into the sound channels

mod envelope;
mod frame_counter;
mod length_counter;
mod linear_counter;
mod sweep;
mod timer;

pub use envelope::Envelope;
pub use frame_counter::{FrameCounter, FrameSignal};
pub use length_counter::LengthCounter;
pub use linear_counter::LinearCounter;
pub use sweep::Sweep;
pub use timer::Timer;
