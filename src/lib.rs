// Goalfinder - Goal-detection training device firmware
//
// The library holds every hardware-independent component so it can be
// exercised on the host:
//   - sensors:    sensor adapter traits + pulse-width measurement
//   - detection:  shot / hit / miss state machine
//   - announce:   one-shot dispatch of detected events to audio
//   - audio:      clip player + scoped-lock handle shared between tasks
//   - led:        LED pattern renderer
//   - metronome:  tick / waiting clip cadence
//   - settings:   persisted configuration + per-cycle mirror
//   - tasks:      periodic task runner and the task bodies
//   - app:        component wiring and task start-up
//   - logger:     queued `log` backend drained by the logger task
//
// Hardware drivers (`drivers`) exist only when building for ESP-IDF; the
// simulated peripherals (`sim`) only on a development host.

pub mod announce;
pub mod app;
pub mod audio;
pub mod clips;
pub mod clock;
pub mod config;
pub mod detection;
pub mod events;
pub mod led;
pub mod logger;
pub mod metronome;
pub mod sensors;
pub mod settings;
pub mod status;
pub mod tasks;

#[cfg(target_os = "espidf")]
pub mod drivers;

#[cfg(not(target_os = "espidf"))]
pub mod sim;

pub use clock::now_ms;
