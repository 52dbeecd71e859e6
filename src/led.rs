// Goalfinder - LED Renderer
//
// Drives one PWM LED channel through the configured pattern. `step()` is
// self-clocked from the start of the current phase and may be called at any
// rate; the output is only written when a phase boundary has passed (or
// brightness changes). All pattern state lives in `Pattern`, reset on every
// mode change.

use crate::events::LedMode;

const FULL: u8 = 255;

const FADE_STEP_MS: u32 = 3;
const FLASH_OFF_MS: u32 = 500;
const FLASH_ON_MS: u32 = 100;
const TURBO_FLASH_MS: u32 = 100;
const TURBO_FLASHES: u8 = 10;
const TURBO_PAUSE_MS: u32 = 750;

/// Falling further behind than this restarts the phase clock instead of
/// replaying every missed phase.
const RESYNC_AFTER_MS: u32 = 1000;

/// PWM output (LEDC on the device), 8-bit duty.
pub trait LedOutput: Send {
    fn set_duty(&mut self, duty: u8);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pattern {
    Steady(u8),
    Fade { duty: u8, rising: bool },
    Flash { on: bool },
    /// `half_phase` counts on and off phases of a burst; the last off phase
    /// is stretched into the pause.
    Turbo { half_phase: u8 },
}

impl Pattern {
    fn initial(mode: LedMode) -> Self {
        match mode {
            LedMode::Off      => Self::Steady(0),
            LedMode::Standard => Self::Steady(FULL),
            LedMode::Fade     => Self::Fade { duty: 0, rising: true },
            LedMode::Flash    => Self::Flash { on: true },
            LedMode::Turbo    => Self::Turbo { half_phase: 0 },
        }
    }

    /// Unscaled duty of the current phase.
    fn duty(&self) -> u8 {
        match *self {
            Self::Steady(duty) => duty,
            Self::Fade { duty, .. } => duty,
            Self::Flash { on } => if on { FULL } else { 0 },
            Self::Turbo { half_phase } => if half_phase % 2 == 0 { FULL } else { 0 },
        }
    }

    fn phase_ms(&self) -> Option<u32> {
        match *self {
            Self::Steady(_) => None,
            Self::Fade { .. } => Some(FADE_STEP_MS),
            Self::Flash { on } => Some(if on { FLASH_ON_MS } else { FLASH_OFF_MS }),
            Self::Turbo { half_phase } => {
                Some(if half_phase == TURBO_FLASHES * 2 - 1 { TURBO_PAUSE_MS } else { TURBO_FLASH_MS })
            }
        }
    }

    fn advance(&mut self) {
        match self {
            Self::Steady(_) => {}
            Self::Fade { duty, rising } => {
                if *rising {
                    *duty += 1;
                    *rising = *duty < FULL;
                } else {
                    *duty -= 1;
                    *rising = *duty == 0;
                }
            }
            Self::Flash { on } => *on = !*on,
            Self::Turbo { half_phase } => *half_phase = (*half_phase + 1) % (TURBO_FLASHES * 2),
        }
    }
}

/// Scale a duty value by a brightness percentage.
pub fn scale_duty(duty: u8, brightness_pct: u8) -> u8 {
    (u16::from(duty) * u16::from(brightness_pct.min(100)) / 100) as u8
}

pub struct LedRenderer {
    output: Box<dyn LedOutput>,
    mode: LedMode,
    brightness_pct: u8,
    pattern: Pattern,
    phase_started_ms: Option<u32>,
    last_duty: Option<u8>,
}

impl LedRenderer {
    pub fn new(output: Box<dyn LedOutput>) -> Self {
        Self {
            output,
            mode: LedMode::Standard,
            brightness_pct: 100,
            pattern: Pattern::initial(LedMode::Standard),
            phase_started_ms: None,
            last_duty: None,
        }
    }

    pub fn mode(&self) -> LedMode {
        self.mode
    }

    pub fn brightness(&self) -> u8 {
        self.brightness_pct
    }

    /// Switch pattern; the new one starts from phase 0 on the next step.
    pub fn set_mode(&mut self, mode: LedMode) {
        if mode != self.mode {
            log::info!("LED mode set to {:?}", mode);
            self.mode = mode;
            self.pattern = Pattern::initial(mode);
            self.phase_started_ms = None;
        }
    }

    pub fn set_brightness(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent != self.brightness_pct {
            log::info!("LED brightness set to {}%", percent);
            self.brightness_pct = percent;
            if self.phase_started_ms.is_some() {
                self.write();
            }
        }
    }

    pub fn step(&mut self, now: u32) {
        let Some(mut started) = self.phase_started_ms else {
            self.phase_started_ms = Some(now);
            self.write();
            return;
        };

        if now.wrapping_sub(started) > RESYNC_AFTER_MS {
            started = now;
        }

        let mut changed = false;
        while let Some(phase) = self.pattern.phase_ms() {
            if now.wrapping_sub(started) < phase {
                break;
            }
            started = started.wrapping_add(phase);
            self.pattern.advance();
            changed = true;
        }
        self.phase_started_ms = Some(started);

        if changed {
            self.write();
        }
    }

    fn write(&mut self) {
        let duty = scale_duty(self.pattern.duty(), self.brightness_pct);
        if self.last_duty != Some(duty) {
            self.last_duty = Some(duty);
            self.output.set_duty(duty);
        }
    }
}
