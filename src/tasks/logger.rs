// Goalfinder - Logger Task
//
// Prints at most one queued log record per tick.

use std::io::{self, Write};
use std::ops::ControlFlow;

use crate::logger::LogDrain;

pub fn run_once(drain: &LogDrain) -> ControlFlow<()> {
    let mut out = io::stdout().lock();
    let printed = match drain.drain_one(&mut out) {
        Ok(true) => out.flush(),
        Ok(false) => Ok(()),
        Err(e) => Err(e),
    };
    if let Err(e) = printed {
        // Records queued from now on overflow and print in place.
        eprintln!("log console write failed: {}", e);
        return ControlFlow::Break(());
    }
    ControlFlow::Continue(())
}
