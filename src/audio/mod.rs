// Audio module - host audio device plumbing
//
// The APU produces mono f32 samples at the configured rate; `output`
// carries them to a cpal stream through a shared ring buffer.

pub mod output;

pub use output::{AudioError, AudioOutput};
