//! Headless front end: commands come in on stdin, images go out as log lines.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use tracing::{error, info, warn};

use mandelfarm_render::RenderedImage;

use crate::controller::{Message, Presenter};
use crate::events::Event;

/// Presenter that logs each finished image instead of painting it.
#[derive(Debug, Default)]
pub struct ConsolePresenter {
    current: Option<RenderedImage>,
    frames: u64,
}

impl Presenter for ConsolePresenter {
    fn draw_image(&mut self, image: RenderedImage) {
        self.frames += 1;
        info!(
            frame = self.frames,
            width = image.width,
            height = image.height,
            rows = image.rows.len(),
            checksum = format_args!("{:016x}", image.checksum()),
            "Image updated"
        );
        self.current = Some(image);
    }

    fn show_error(&mut self, message: &str) {
        error!("{message}");
        if let Some(image) = &self.current {
            info!(
                frame = self.frames,
                checksum = format_args!("{:016x}", image.checksum()),
                "Keeping previous image"
            );
        }
    }
}

/// Read commands from stdin on a background thread and post them to the
/// control loop.  End of input is treated as an exit request.
pub fn spawn_input_reader(messages: Sender<Message>) -> JoinHandle<()> {
    thread::Builder::new()
        .name("mandelfarm-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Failed to read input: {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Event>() {
                    Ok(event) => {
                        if messages.send(Message::Input(event)).is_err()
                            || event == Event::ExitRequested
                        {
                            return;
                        }
                    }
                    Err(e) => warn!("{e}"),
                }
            }
            let _ = messages.send(Message::Input(Event::ExitRequested));
        })
        .expect("Failed to spawn input thread")
}
