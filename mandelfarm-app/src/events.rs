use std::str::FromStr;

use thiserror::Error;

use mandelfarm_core::{PixelRect, PixelSize};

/// User intents that reach the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    NewRequested,
    ExitRequested,
    UndoRequested,
    ResizeOccurred(PixelSize),
    RegionSelected(PixelRect),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEventError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try new, undo, resize W H, select X Y W H, exit)")]
    UnknownCommand(String),
    #[error("`{command}` takes {expected} numeric arguments")]
    BadArguments {
        command: &'static str,
        expected: usize,
    },
}

/// Parse exactly `N` unsigned integers, rejecting extras.
fn numbers<const N: usize>(
    command: &'static str,
    args: &[&str],
) -> Result<[u32; N], ParseEventError> {
    let bad = || ParseEventError::BadArguments {
        command,
        expected: N,
    };
    if args.len() != N {
        return Err(bad());
    }
    let mut out = [0u32; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().map_err(|_| bad())?;
    }
    Ok(out)
}

impl FromStr for Event {
    type Err = ParseEventError;

    /// Parse one console line, e.g. `resize 800 600` or `select 10 10 200 150`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ParseEventError::Empty)?;
        let args: Vec<&str> = words.collect();

        match command.to_ascii_lowercase().as_str() {
            "new" => numbers::<0>("new", &args).map(|_| Event::NewRequested),
            "undo" => numbers::<0>("undo", &args).map(|_| Event::UndoRequested),
            "exit" | "quit" => numbers::<0>("exit", &args).map(|_| Event::ExitRequested),
            "resize" => {
                let [width, height] = numbers::<2>("resize", &args)?;
                Ok(Event::ResizeOccurred(PixelSize::new(width, height)))
            }
            "select" => {
                let [x, y, width, height] = numbers::<4>("select", &args)?;
                Ok(Event::RegionSelected(PixelRect::new(x, y, width, height)))
            }
            _ => Err(ParseEventError::UnknownCommand(command.to_string())),
        }
    }
}
