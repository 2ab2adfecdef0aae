//! Snapshot data model: Buttons, DPad, Snapshot.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Size of a [`Snapshot`] on the wire, in bytes.
pub const SNAPSHOT_LEN: usize = 7;

/// Resting value of every analog axis.
pub const AXIS_CENTER: u8 = 128;

/// Button state as a 16-bit field, sent little-endian.
///
/// Bits 0..=13 carry the fourteen controller buttons in HID usage order.
/// Bits 14 and 15 are reserved and passed through untouched.
///
/// # Example
///
/// ```
/// use link_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::HOME;
/// assert!(buttons.contains(Buttons::A));
/// assert!(!buttons.contains(Buttons::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const Y: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const A: Self = Self(1 << 2);
    pub const X: Self = Self(1 << 3);
    pub const L: Self = Self(1 << 4);
    pub const R: Self = Self(1 << 5);
    pub const ZL: Self = Self(1 << 6);
    pub const ZR: Self = Self(1 << 7);
    pub const MINUS: Self = Self(1 << 8);
    pub const PLUS: Self = Self(1 << 9);
    pub const LSTICK: Self = Self(1 << 10); // Left stick press
    pub const RSTICK: Self = Self(1 << 11); // Right stick press
    pub const HOME: Self = Self(1 << 12);
    pub const CAPTURE: Self = Self(1 << 13);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Mask of the fourteen significant bits.
    pub const SIGNIFICANT: Self = Self(0x3FFF);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Get the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Hat switch position.
///
/// The discriminants are the codes carried in the d-pad byte.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DPad {
    Up = 0,
    UpRight = 1,
    Right = 2,
    DownRight = 3,
    Down = 4,
    DownLeft = 5,
    Left = 6,
    UpLeft = 7,
    #[default]
    Centered = 0x0F,
}

impl DPad {
    /// Decode a raw d-pad byte. Returns `None` for codes outside the nine valid values.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Up,
            1 => Self::UpRight,
            2 => Self::Right,
            3 => Self::DownRight,
            4 => Self::Down,
            5 => Self::DownLeft,
            6 => Self::Left,
            7 => Self::UpLeft,
            0x0F => Self::Centered,
            _ => return None,
        })
    }

    /// Raw code for the d-pad byte.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Build a hat position from four direction switches.
    ///
    /// Opposing directions cancel each other out.
    #[must_use]
    pub const fn from_directions(up: bool, down: bool, left: bool, right: bool) -> Self {
        let vertical = (up as i8) - (down as i8);
        let horizontal = (right as i8) - (left as i8);
        match (vertical, horizontal) {
            (1, 0) => Self::Up,
            (1, 1) => Self::UpRight,
            (0, 1) => Self::Right,
            (-1, 1) => Self::DownRight,
            (-1, 0) => Self::Down,
            (-1, -1) => Self::DownLeft,
            (0, -1) => Self::Left,
            (1, -1) => Self::UpLeft,
            _ => Self::Centered,
        }
    }
}

/// Complete controller state as exchanged between the two boards.
///
/// Wire layout (7 bytes, no variable-length fields):
///
/// | Offset | Field                     |
/// |--------|---------------------------|
/// | 0..2   | buttons, little-endian    |
/// | 2      | d-pad code                |
/// | 3      | left stick X              |
/// | 4      | left stick Y              |
/// | 5      | right stick X             |
/// | 6      | right stick Y             |
///
/// The d-pad byte is kept raw: framing never validates payload contents,
/// so whatever the sender put there is what the host receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Snapshot {
    pub buttons: Buttons,
    pub dpad: u8,
    pub left_x: u8,
    pub left_y: u8,
    pub right_x: u8,
    pub right_y: u8,
}

impl Snapshot {
    /// No buttons, d-pad centered, sticks centered.
    pub const NEUTRAL: Self = Self {
        buttons: Buttons::NONE,
        dpad: DPad::Centered as u8,
        left_x: AXIS_CENTER,
        left_y: AXIS_CENTER,
        right_x: AXIS_CENTER,
        right_y: AXIS_CENTER,
    };

    /// Decode the 7-byte wire layout.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SNAPSHOT_LEN]) -> Self {
        Self {
            buttons: Buttons(u16::from_le_bytes([bytes[0], bytes[1]])),
            dpad: bytes[2],
            left_x: bytes[3],
            left_y: bytes[4],
            right_x: bytes[5],
            right_y: bytes[6],
        }
    }

    /// Encode into the 7-byte wire layout.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; SNAPSHOT_LEN] {
        let buttons = self.buttons.0.to_le_bytes();
        [
            buttons[0],
            buttons[1],
            self.dpad,
            self.left_x,
            self.left_y,
            self.right_x,
            self.right_y,
        ]
    }

    /// Decode from a slice, which must be exactly [`SNAPSHOT_LEN`] bytes long.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; SNAPSHOT_LEN] = bytes.try_into().ok()?;
        Some(Self::from_bytes(bytes))
    }

    /// The d-pad byte as a [`DPad`], if it holds one of the nine valid codes.
    #[inline]
    #[must_use]
    pub const fn dpad(&self) -> Option<DPad> {
        DPad::from_code(self.dpad)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
