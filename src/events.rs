// Goalfinder - Game Events & Task Commands

// ---------------------------------------------------------------------------
// Announcements (produced by the detection engine, consumed once)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Announcement {
    #[default]
    None,
    Shot,
    Hit,
    Miss,
}

impl Announcement {
    /// Trace label written when the announcement is dispatched.
    pub fn trace_label(&self) -> &'static str {
        match self {
            Self::None => "-> none",
            Self::Shot => "-> shot",
            Self::Hit  => "-> hit",
            Self::Miss => "-> miss",
        }
    }
}

// ---------------------------------------------------------------------------
// LED Modes
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedMode {
    Off,
    Standard,
    Fade,
    #[default]
    Flash,
    Turbo,
}

impl LedMode {
    /// Numeric encoding used by the settings store.
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Off      => 0,
            Self::Standard => 1,
            Self::Fade     => 2,
            Self::Flash    => 3,
            Self::Turbo    => 4,
        }
    }

    /// Decode a stored value; unknown values fall back to the default mode.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Off,
            1 => Self::Standard,
            2 => Self::Fade,
            3 => Self::Flash,
            4 => Self::Turbo,
            _ => Self::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Task Commands - sent over channels by the settings mirror
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedCommand {
    SetMode(LedMode),
    /// Brightness in percent (0-100).
    SetBrightness(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetronomeCommand {
    /// Index into the tick clip table.
    SetClip(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_led_mode_decodes_to_flash() {
        assert_eq!(LedMode::from_raw(42), LedMode::Flash);
        assert_eq!(LedMode::from_raw(-1), LedMode::Flash);
    }
}
