use std::io::BufRead;
use std::path::PathBuf;
use std::process;
use std::thread;

use spindle_engine::{Driver, EngineError, RunOutcome};

use crate::console::ConsoleIo;
use crate::demo::LockhouseStory;

/// Exit code for a savegame the engine cannot read at all.
const EXIT_BAD_SAVEGAME: i32 = 10;

pub fn run(save: PathBuf, seed: Option<u64>, timer: bool) -> Result<(), String> {
    let story = LockhouseStory::new(timer);
    let mut driver =
        Driver::new(Box::new(story), Box::new(ConsoleIo::new())).with_save_path(save);
    if let Some(seed) = seed {
        driver = driver.with_seed(seed);
    }

    // The driver loop runs here on the main thread; a detached reader
    // thread feeds stdin lines into the session. When the loop ends the
    // process exits and takes the reader with it.
    let input = driver.input_handle();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => input.push(line),
                Err(_) => break,
            }
        }
        input.disconnect();
    });

    match driver.run() {
        Ok(RunOutcome::Quit | RunOutcome::Completed) => Ok(()),
        Err(EngineError::SaveFormat { reason }) => {
            eprintln!("error: cannot read the savegame: {reason}");
            process::exit(EXIT_BAD_SAVEGAME);
        }
        Err(e) => Err(format!("game error: {e}")),
    }
}
