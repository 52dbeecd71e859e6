// Goalfinder - Task Scheduling
//
// Every task is a std thread (a FreeRTOS task on the device) running a
// periodic job: do one short step, then sleep for the remainder of the
// period. On ESP-IDF the thread spawn configuration carries the stack size,
// priority and core affinity of the next spawned thread.

pub mod audio;
pub mod detection;
pub mod led;
pub mod logger;

use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::*;

#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    pub name: &'static str,
    pub stack_size: usize,
    pub priority: u8,
    pub core: usize,
    pub interval: Duration,
}

pub const AUDIO_TASK: TaskConfig = TaskConfig {
    name: "audio",
    stack_size: STACK_AUDIO,
    priority: PRIORITY_AUDIO,
    core: CORE_AUDIO,
    interval: Duration::from_millis(AUDIO_TASK_INTERVAL_MS),
};

pub const DETECTION_TASK: TaskConfig = TaskConfig {
    name: "detection",
    stack_size: STACK_DETECTION,
    priority: PRIORITY_DETECTION,
    core: CORE_DETECTION,
    interval: Duration::from_millis(DETECTION_TASK_INTERVAL_MS),
};

pub const LED_TASK: TaskConfig = TaskConfig {
    name: "led",
    stack_size: STACK_LED,
    priority: PRIORITY_LED,
    core: CORE_LED,
    interval: Duration::from_millis(LED_TASK_INTERVAL_MS),
};

pub const LOGGER_TASK: TaskConfig = TaskConfig {
    name: "logger",
    stack_size: STACK_LOGGER,
    priority: PRIORITY_LOGGER,
    core: CORE_LOGGER,
    interval: Duration::from_millis(LOGGER_TASK_INTERVAL_MS),
};

/// Spawn `job` as a periodic task described by `config`.
pub fn spawn<F>(config: TaskConfig, job: F) -> anyhow::Result<JoinHandle<()>>
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    #[cfg(target_os = "espidf")]
    apply_spawn_configuration(&config)?;

    let handle = thread::Builder::new()
        .name(config.name.into())
        .stack_size(config.stack_size)
        .spawn(move || {
            log::info!("{} task started", config.name);
            run_periodic(config.interval, job);
            log::warn!("{} task exited", config.name);
        });

    #[cfg(target_os = "espidf")]
    esp_idf_hal::task::thread::ThreadSpawnConfiguration::default().set()?;

    Ok(handle?)
}

#[cfg(target_os = "espidf")]
fn apply_spawn_configuration(config: &TaskConfig) -> anyhow::Result<()> {
    use esp_idf_hal::cpu::Core;
    use esp_idf_hal::task::thread::ThreadSpawnConfiguration;

    // FreeRTOS wants a NUL-terminated name for the lifetime of the task.
    let name: &'static [u8] = Box::leak(format!("{}\0", config.name).into_bytes().into_boxed_slice());
    ThreadSpawnConfiguration {
        name: Some(name),
        stack_size: config.stack_size,
        priority: config.priority,
        pin_to_core: Some(if config.core == 0 { Core::Core0 } else { Core::Core1 }),
        ..Default::default()
    }
    .set()?;
    Ok(())
}

/// Run `job` every `interval` until it breaks. Overrunning iterations start
/// the next one immediately.
pub fn run_periodic<F>(interval: Duration, mut job: F)
where
    F: FnMut() -> ControlFlow<()>,
{
    loop {
        let tick_start = Instant::now();

        if job().is_break() {
            return;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_job_runs_until_break() {
        let mut runs = 0;
        run_periodic(Duration::from_millis(1), || {
            runs += 1;
            if runs == 5 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(runs, 5);
    }

    #[test]
    fn periodic_job_keeps_its_period() {
        let start = Instant::now();
        let mut runs = 0;
        run_periodic(Duration::from_millis(5), || {
            runs += 1;
            if runs == 4 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        });
        assert!(start.elapsed() >= Duration::from_millis(15));
    }

    #[test]
    fn spawned_task_joins_after_break() {
        let config = TaskConfig { interval: Duration::from_millis(1), ..LOGGER_TASK };
        let mut left = 3;
        let handle = spawn(config, move || {
            left -= 1;
            if left == 0 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
        })
        .unwrap();
        handle.join().unwrap();
    }
}
