use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info};

use mandelfarm_core::{PixelSize, ViewHistory, ViewState};
use mandelfarm_render::{RenderEngine, RenderedImage, WorkerPool};

use crate::debounce::Debouncer;
use crate::events::Event;

/// Everything the control loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Input(Event),
    /// Fired by the debouncer once a burst of resizes has settled.
    Recompute,
}

/// Whether the control loop keeps going after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Where finished images and render errors end up.
pub trait Presenter {
    /// Replace the displayed image.
    fn draw_image(&mut self, image: RenderedImage);

    /// Report a failed render.  The displayed image must stay as it was.
    fn show_error(&mut self, message: &str);
}

/// Owns the view history and drives one render at a time.
///
/// All state lives on the control thread; the only other thread that talks to
/// the loop is the debouncer, through the message channel.
pub struct Controller<P: WorkerPool, V: Presenter> {
    engine: RenderEngine<P>,
    presenter: V,
    history: ViewHistory,
    image_size: PixelSize,
    debouncer: Debouncer,
}

/// The session's first view: the initial region fitted to the starting
/// image size, or the stock 500 px view if that size is empty.
fn initial_view(image_size: PixelSize) -> ViewState {
    ViewState::fit_to_image(image_size).unwrap_or_else(|_| ViewState::initial())
}

impl<P: WorkerPool, V: Presenter> Controller<P, V> {
    /// `messages` is the sending side of the loop's own channel; the
    /// debouncer posts [`Message::Recompute`] there.
    pub fn new(
        engine: RenderEngine<P>,
        presenter: V,
        image_size: PixelSize,
        debounce: Duration,
        messages: Sender<Message>,
    ) -> Self {
        let debouncer = Debouncer::new(debounce, move || {
            let _ = messages.send(Message::Recompute);
        });
        Self {
            engine,
            presenter,
            history: ViewHistory::new(initial_view(image_size)),
            image_size,
            debouncer,
        }
    }

    pub fn history(&self) -> &ViewHistory {
        &self.history
    }

    #[cfg(test)]
    pub fn presenter(&self) -> &V {
        &self.presenter
    }

    pub fn engine(&self) -> &RenderEngine<P> {
        &self.engine
    }

    /// Draw the initial view, then handle messages until exit.
    pub fn run(&mut self, messages: Receiver<Message>) {
        info!(
            width = self.image_size.width,
            height = self.image_size.height,
            parallelism = self.engine.parallelism(),
            "Control loop started"
        );
        self.redraw();
        for message in messages.iter() {
            if self.handle(message) == Flow::Exit {
                return;
            }
        }
        self.shutdown();
    }

    /// Handle one message to completion.
    pub fn handle(&mut self, message: Message) -> Flow {
        match message {
            Message::Recompute => {
                self.redraw();
                Flow::Continue
            }
            Message::Input(event) => self.handle_event(event),
        }
    }

    fn handle_event(&mut self, event: Event) -> Flow {
        debug!(?event, "Handling event");
        match event {
            Event::NewRequested => match ViewState::fit_to_image(self.image_size) {
                Ok(view) => self.render_and_push(view),
                Err(e) => self.report(&e.to_string()),
            },
            Event::UndoRequested => {
                if self.history.undo() {
                    self.redraw();
                }
            }
            Event::ResizeOccurred(size) => {
                self.image_size = size;
                self.debouncer.trigger();
            }
            Event::RegionSelected(selection) => {
                match self
                    .history
                    .peek()
                    .zoom_to_selection(self.image_size, selection)
                {
                    Ok(view) => self.render_and_push(view),
                    Err(e) => self.report(&e.to_string()),
                }
            }
            Event::ExitRequested => {
                self.shutdown();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Re-render the active view without touching history.
    fn redraw(&mut self) {
        let view = self.history.peek();
        self.render(view);
    }

    /// Render `view` and make it the active state if the render succeeds.
    fn render_and_push(&mut self, view: ViewState) {
        if self.render(view) {
            self.history.push(view);
        }
    }

    fn render(&mut self, view: ViewState) -> bool {
        let PixelSize { width, height } = self.image_size;
        match self.engine.render_image(width, height, &view) {
            Ok(image) => {
                self.presenter.draw_image(image);
                true
            }
            Err(e) => {
                self.report(&format!("Error calculating lines:\n{e}"));
                false
            }
        }
    }

    fn report(&mut self, message: &str) {
        error!("{message}");
        self.presenter.show_error(message);
    }

    fn shutdown(&mut self) {
        info!("Exit requested");
        self.engine.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mandelfarm_core::PixelRect;
    use mandelfarm_render::{render_band, LocalPool, RenderRequest, Row, TaskExecutor};

    #[derive(Default)]
    struct RecordingPresenter {
        images: Vec<RenderedImage>,
        errors: Vec<String>,
    }

    impl Presenter for RecordingPresenter {
        fn draw_image(&mut self, image: RenderedImage) {
            self.images.push(image);
        }

        fn show_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
    }

    const SIZE: PixelSize = PixelSize::new(40, 30);

    fn controller_with(
        pool: LocalPool,
        debounce: Duration,
    ) -> (Controller<LocalPool, RecordingPresenter>, Receiver<Message>) {
        let engine = RenderEngine::new(pool, 2, Duration::from_secs(1)).unwrap();
        let (tx, rx) = crossbeam_channel::unbounded();
        let controller =
            Controller::new(engine, RecordingPresenter::default(), SIZE, debounce, tx);
        (controller, rx)
    }

    fn controller() -> Controller<LocalPool, RecordingPresenter> {
        controller_with(LocalPool::new(2).unwrap(), Debouncer::DEFAULT_DELAY).0
    }

    fn input(event: Event) -> Message {
        Message::Input(event)
    }

    #[test]
    fn new_fits_view_and_pushes() {
        let mut c = controller();
        assert_eq!(c.handle(input(Event::NewRequested)), Flow::Continue);

        assert_eq!(c.history().depth(), 2);
        assert_eq!(c.history().peek(), ViewState::fit_to_image(SIZE).unwrap());
        let image = &c.presenter().images[0];
        assert_eq!((image.width, image.height), (40, 30));
        assert_eq!(image.rows.len(), 30);
    }

    #[test]
    fn session_starts_fitted_to_image_size() {
        let c = controller();
        assert_eq!(c.history().depth(), 1);
        assert_eq!(c.history().peek(), ViewState::fit_to_image(SIZE).unwrap());
        assert_eq!(initial_view(PixelSize::new(0, 30)), ViewState::initial());
    }

    #[test]
    fn zoom_then_undo_restores_previous_image() {
        let mut c = controller();
        c.handle(Message::Recompute);
        let first = &c.presenter().images[0];
        assert!(
            first.rows.iter().flat_map(|r| &r.pixels).any(|&p| p != first.rows[0].pixels[0]),
            "starting view should show more than one colour"
        );
        c.handle(input(Event::RegionSelected(PixelRect::new(10, 5, 20, 15))));
        assert_eq!(c.history().depth(), 2);

        c.handle(input(Event::UndoRequested));
        assert_eq!(c.history().depth(), 1);

        let images = &c.presenter().images;
        assert_eq!(images.len(), 3);
        assert_ne!(images[0].checksum(), images[1].checksum());
        assert_eq!(images[0], images[2]);
    }

    #[test]
    fn undo_at_root_does_nothing() {
        let mut c = controller();
        c.handle(input(Event::UndoRequested));
        assert_eq!(c.history().depth(), 1);
        assert!(c.presenter().images.is_empty());
        assert!(c.presenter().errors.is_empty());
    }

    #[test]
    fn failed_render_keeps_history_and_image() {
        let executor: TaskExecutor =
            Arc::new(|request: &RenderRequest| -> Result<Vec<Row>, String> {
                if request.first_row > 0 {
                    Err("worker went away".to_string())
                } else {
                    Ok(render_band(request))
                }
            });
        let pool = LocalPool::with_executor(2, executor).unwrap();
        let (mut c, _rx) = controller_with(pool, Debouncer::DEFAULT_DELAY);

        c.handle(input(Event::RegionSelected(PixelRect::new(0, 0, 20, 20))));
        assert_eq!(c.history().depth(), 1);
        assert!(c.presenter().images.is_empty());
        let errors = &c.presenter().errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error calculating lines"), "{}", errors[0]);
        assert!(errors[0].contains("worker went away"), "{}", errors[0]);
    }

    #[test]
    fn empty_selection_is_reported() {
        let mut c = controller();
        c.handle(input(Event::RegionSelected(PixelRect::new(5, 5, 0, 10))));
        assert_eq!(c.history().depth(), 1);
        assert_eq!(c.presenter().errors.len(), 1);
    }

    #[test]
    fn resize_burst_recomputes_once() {
        let (mut c, rx) = controller_with(LocalPool::new(2).unwrap(), Duration::from_millis(30));
        for width in [41, 42, 43, 44] {
            c.handle(input(Event::ResizeOccurred(PixelSize::new(width, 20))));
        }
        assert!(c.presenter().images.is_empty());

        let message = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(message, Message::Recompute);
        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());

        c.handle(message);
        let image = &c.presenter().images[0];
        assert_eq!((image.width, image.height), (44, 20));
    }

    #[test]
    fn zero_sized_window_is_an_error_not_a_crash() {
        let mut c = controller();
        c.handle(input(Event::ResizeOccurred(PixelSize::new(0, 0))));
        c.handle(Message::Recompute);
        assert_eq!(c.presenter().errors.len(), 1);
        assert!(c.presenter().images.is_empty());
    }

    #[test]
    fn exit_closes_the_pool() {
        let mut c = controller();
        assert_eq!(c.handle(input(Event::ExitRequested)), Flow::Exit);
        assert_eq!(c.engine().dispatcher().pool().connection_count(), 0);
    }

    #[test]
    fn run_draws_initial_view_and_stops_on_exit() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let engine = RenderEngine::new(LocalPool::new(1).unwrap(), 1, Duration::from_secs(1)).unwrap();
        let mut c = Controller::new(
            engine,
            RecordingPresenter::default(),
            SIZE,
            Debouncer::DEFAULT_DELAY,
            tx.clone(),
        );
        tx.send(input(Event::NewRequested)).unwrap();
        tx.send(input(Event::ExitRequested)).unwrap();
        tx.send(input(Event::UndoRequested)).unwrap();

        c.run(rx);
        assert_eq!(c.presenter().images.len(), 2);
        assert_eq!(c.history().depth(), 2, "messages after exit are not handled");
    }
}
