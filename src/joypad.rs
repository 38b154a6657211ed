use log::trace;

pub const SELECT_DIRECTIONS: u8 = 0b0001_0000;
pub const SELECT_BUTTONS: u8 = 0b0010_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Joypad {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

impl Joypad {
    pub fn new() -> Joypad {
        Joypad {
            up: false,
            down: false,
            left: false,
            right: false,
            a: false,
            b: false,
            start: false,
            select: false,
        }
    }

    pub fn update_button(&mut self, button: Button, pressed: bool) {
        match button {
            Button::Up => self.up = pressed,
            Button::Down => self.down = pressed,
            Button::Left => self.left = pressed,
            Button::Right => self.right = pressed,
            Button::A => self.a = pressed,
            Button::B => self.b = pressed,
            Button::Start => self.start = pressed,
            Button::Select => self.select = pressed,
        }
    }

    /// P1 as the CPU sees it for the select lines in `joypad_state`.
    /// Pressed buttons read as 0; unused bits 6-7 read as 1.
    pub fn as_u8(&self, joypad_state: u8) -> u8 {
        let button_select = joypad_state & SELECT_BUTTONS == 0;
        let direction_select = joypad_state & SELECT_DIRECTIONS == 0;
        if button_select && direction_select {
            trace!("Joypad has buttons and d-pad mode selected");
        }

        let mut pressed = 0;

        if button_select {
            if self.start {
                pressed |= 0b0000_1000;
            }
            if self.select {
                pressed |= 0b0000_0100;
            }
            if self.b {
                pressed |= 0b0000_0010;
            }
            if self.a {
                pressed |= 0b0000_0001;
            }
        }
        if direction_select {
            if self.down {
                pressed |= 0b0000_1000;
            }
            if self.up {
                pressed |= 0b0000_0100;
            }
            if self.left {
                pressed |= 0b0000_0010;
            }
            if self.right {
                pressed |= 0b0000_0001;
            }
        }

        0b1100_0000 | (joypad_state & 0b0011_0000) | (!pressed & 0b0000_1111)
    }
}
