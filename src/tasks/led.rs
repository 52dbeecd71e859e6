// Goalfinder - LED Task

use std::ops::ControlFlow;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::clock::Clock;
use crate::events::LedCommand;
use crate::led::LedRenderer;

pub struct LedTask {
    renderer: LedRenderer,
    commands: Receiver<LedCommand>,
    clock: Arc<dyn Clock>,
}

impl LedTask {
    pub fn new(renderer: LedRenderer, commands: Receiver<LedCommand>, clock: Arc<dyn Clock>) -> Self {
        Self { renderer, commands, clock }
    }

    pub fn run_once(&mut self) -> ControlFlow<()> {
        for command in self.commands.try_iter() {
            match command {
                LedCommand::SetMode(mode) => self.renderer.set_mode(mode),
                LedCommand::SetBrightness(percent) => self.renderer.set_brightness(percent),
            }
        }
        self.renderer.step(self.clock.now_ms());
        ControlFlow::Continue(())
    }
}
