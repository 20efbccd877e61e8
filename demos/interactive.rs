//! Interactive driver for a single text logger.
//!
//! Reads one command per line from stdin:
//! `1`-`5` log a statement at Error..Verbose, `f` flushes, `o` prints the
//! current file size, `q` quits.
//!
//! ```text
//! cargo run --example interactive -- ./TestLog.txt verbose
//! ```
use {
    std::io::{self, BufRead as _},
    textlogger::{LogLevel, TextLogger, TextLoggerBuilder, TextLoggerError},
    tracing_subscriber::{util::SubscriberInitExt, EnvFilter},
};

const MAX_BUFFER_BYTES: usize = 1024;
const MAX_FILE_BYTES: u64 = 2048;
const LIMIT_NOTICE: &str = "\n[ERR LIMIT]";

/// Owned by the driver, not the logger.
struct DemoLoop {
    running: bool,
}

impl DemoLoop {
    fn dispatch(&mut self, logger: &mut TextLogger, key: char) -> Result<(), TextLoggerError> {
        match key {
            'q' => {
                println!("stopping...");
                self.running = false;
                Ok(())
            }
            '1' => logger.log_error("Error statement"),
            '2' => logger.log_warn("Warn statement"),
            '3' => logger.log_info("Info statement"),
            '4' => logger.log_debug("Debug statement"),
            '5' => logger.log_verbose("Verbose statement"),
            'f' => logger.flush(),
            'o' => {
                println!("{}", logger.query_file_size()?);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .finish()
        .try_init()?;

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "./TestLog.txt".to_string());
    let level = match args.next() {
        Some(level) => level.parse::<LogLevel>()?,
        None => LogLevel::Verbose,
    };

    let mut logger = TextLoggerBuilder::new(&path, LIMIT_NOTICE)
        .min_level(level)
        .buffer_capacity(MAX_BUFFER_BYTES)
        .file_size_ceiling(MAX_FILE_BYTES)
        .build()?;
    println!("logging to '{path}' at level {level}, keys: 1-5 log, f flush, o size, q quit");

    let mut demo = DemoLoop { running: true };
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while demo.running {
        let Some(line) = lines.next() else {
            break;
        };
        let Some(key) = line?.trim().chars().next() else {
            continue;
        };

        match demo.dispatch(&mut logger, key) {
            Ok(()) => {}
            Err(TextLoggerError::InsufficientFileSpace) => println!("Insufficient file space."),
            Err(err @ TextLoggerError::FileError { .. }) => {
                eprintln!("File error: {err}");
                return Err(err.into());
            }
            Err(err) => eprintln!("{err}"),
        }
    }

    match logger.destroy() {
        Ok(()) | Err(TextLoggerError::InsufficientFileSpace) => {}
        Err(err) => eprintln!("Final flush failed: {err}"),
    }
    println!("done");
    Ok(())
}
