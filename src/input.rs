// Input module - standard controller serial protocol
//
// Writing bit 0 of $4016 drives the strobe line for both pads. While the
// strobe is high every read reports the live A button; on the falling edge
// the current button state is latched, and each following read of $4016 /
// $4017 shifts out one button in the order A, B, Select, Start, Up, Down,
// Left, Right. After eight reads the data line sticks high. Bit 6 of the
// returned byte always reads 1.

use serde::{Deserialize, Serialize};

/// The eight buttons, in shift-out order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    #[inline]
    fn bit(self) -> u8 {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::Select => 2,
            Button::Start => 3,
            Button::Up => 4,
            Button::Down => 5,
            Button::Left => 6,
            Button::Right => 7,
        }
    }
}

/// One controller's live button state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Controller {
    buttons: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= 1 << button.bit();
        } else {
            self.buttons &= !(1 << button.bit());
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & (1 << button.bit()) != 0
    }
}

/// Both controller ports plus the shared strobe latch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputPort {
    controllers: [Controller; 2],
    /// Latched snapshots shifted out while the strobe is low
    latched: [u8; 2],
    /// Next bit to report, per controller (0-8)
    read_index: [u8; 2],
    strobe: bool,
}

impl InputPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.strobe = false;
        self.latched = [0; 2];
        self.read_index = [0; 2];
    }

    /// Host-side button update; called between frames
    pub fn set_button(&mut self, controller: usize, button: Button, pressed: bool) {
        self.controllers[controller & 1].set_button(button, pressed);
    }

    pub fn controller(&self, controller: usize) -> &Controller {
        &self.controllers[controller & 1]
    }

    /// $4016 write: strobe both pads; the falling edge latches buttons
    pub fn write_strobe(&mut self, value: u8) {
        let new_strobe = value & 1 != 0;
        if self.strobe && !new_strobe {
            self.latched = [self.controllers[0].buttons, self.controllers[1].buttons];
            self.read_index = [0; 2];
        }
        self.strobe = new_strobe;
    }

    /// $4016 / $4017 read: one button bit, then the line sticks high
    pub fn read(&mut self, controller: usize) -> u8 {
        let id = controller & 1;

        let bit = if self.strobe {
            self.controllers[id].buttons & 1
        } else if self.read_index[id] < 8 {
            let bit = (self.latched[id] >> self.read_index[id]) & 1;
            self.read_index[id] += 1;
            bit
        } else {
            1
        };

        // Bit 6 carries open-bus high on the stock console
        bit | 0x40
    }
}
