//! The terminal host for a [`FeedList`].
//!
//! [`FeedProgram`] owns the terminal, the list and the state it reads, and
//! drives them from a single `tokio::select!` loop:
//!
//! 1. Terminal input scrolls the feed and is re-dispatched as viewport
//!    `scroll`/`resize` events, which the list's monitor debounces.
//! 2. When an evaluation falls due it runs against the geometry of the last
//!    drawn frame and may ask for the next page.
//! 3. Page requests are fetched on spawned tasks; finished pages are merged
//!    into the store and appended to the list.
//! 4. Store revisions re-project the list, and the screen is redrawn at most
//!    once per frame.

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::{cursor, execute};
use feedkit_core::{
    Clock, EventKind, FeedList, FeedProps, FeedSource, FeedState, ItemRef, LayoutMode, LoadMore,
    MonitorConfig, ResolvedConfig, SystemClock, ViewportMonitor, WindowEvents,
};
use feedkit_widgets::{
    CellMetrics, FeedLines, FeedScroll, FeedView, LoadingIndicator, Summary, TerminalViewport,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::io::{stdout, Stdout};
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;

/// How long the loop sleeps when no evaluation is pending.
const IDLE: Duration = Duration::from_secs(3600);

/// Errors that can occur while initializing or running a [`FeedProgram`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// An I/O error from terminal setup, input, rendering, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration options for a [`FeedProgram`].
///
/// Use struct update syntax to override only what you need:
///
/// ```rust,ignore
/// let opts = ProgramOptions {
///     title: Some("Trending".into()),
///     ..ProgramOptions::from_config(&config)
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    /// Target frames per second (default: 30, max: 120).
    pub fps: u32,
    /// Start in alternate screen (default: true).
    pub alt_screen: bool,
    /// Capture the mouse so the wheel scrolls the feed (default: true).
    pub mouse_capture: bool,
    /// Set terminal title.
    pub title: Option<String>,
    /// Whether to catch panics and restore terminal (default: true).
    pub catch_panics: bool,
    /// Whether to quit on SIGINT (default: true).
    pub handle_signals: bool,
    pub monitor: MonitorConfig,
    pub metrics: CellMetrics,
    /// Rows moved per wheel notch.
    pub scroll_step: usize,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            fps: 30,
            alt_screen: true,
            mouse_capture: true,
            title: None,
            catch_panics: true,
            handle_signals: true,
            monitor: MonitorConfig::default(),
            metrics: CellMetrics::default(),
            scroll_step: 3,
        }
    }
}

impl ProgramOptions {
    /// Defaults with the viewport section of a resolved configuration.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            monitor: config.monitor.clone(),
            ..Self::default()
        }
    }
}

/// One fetched page, in listing order.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<(ItemRef, R)>,
    /// No pages follow this one.
    pub last: bool,
}

impl<R> Page<R> {
    pub fn new(items: Vec<(ItemRef, R)>) -> Self {
        Self { items, last: false }
    }

    /// The end of the feed.
    pub fn final_page(items: Vec<(ItemRef, R)>) -> Self {
        Self { items, last: true }
    }
}

/// Loads the page after an anchor, or the first page for `None`.
///
/// Implemented for any `Fn(Option<ItemRef>) -> impl Future<Output =
/// Result<Page<R>, E>>`, so a closure returning an `async move` block is
/// enough.
pub trait PageFetcher<R>: 'static {
    type Error: fmt::Display + Send + 'static;
    type Future: Future<Output = Result<Page<R>, Self::Error>> + Send + 'static;

    fn fetch(&self, after: Option<ItemRef>) -> Self::Future;
}

impl<R, E, F, Fut> PageFetcher<R> for F
where
    F: Fn(Option<ItemRef>) -> Fut + 'static,
    Fut: Future<Output = Result<Page<R>, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    type Error = E;
    type Future = Fut;

    fn fetch(&self, after: Option<ItemRef>) -> Fut {
        self(after)
    }
}

/// A finished fetch on its way back to the loop.
struct Fetched<R> {
    anchor: Option<ItemRef>,
    result: Result<Page<R>, String>,
}

/// The list's load-more capability: forwards anchors to the loop.
struct PageRequests(mpsc::UnboundedSender<ItemRef>);

impl LoadMore<ItemRef> for PageRequests {
    fn load_more(&self, anchor: &ItemRef) {
        // A closed channel means the loop has exited.
        let _ = self.0.send(anchor.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Rows(isize),
    Pages(isize),
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Quit,
    Scroll(Motion),
    ToggleLowRated,
}

fn key_action(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('d') => Some(Action::Scroll(Motion::Pages(1))),
            KeyCode::Char('u') => Some(Action::Scroll(Motion::Pages(-1))),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Down | KeyCode::Char('j') => Action::Scroll(Motion::Rows(1)),
        KeyCode::Up | KeyCode::Char('k') => Action::Scroll(Motion::Rows(-1)),
        KeyCode::PageDown | KeyCode::Char(' ') => Action::Scroll(Motion::Pages(1)),
        KeyCode::PageUp => Action::Scroll(Motion::Pages(-1)),
        KeyCode::Home | KeyCode::Char('g') => Action::Scroll(Motion::Top),
        KeyCode::End | KeyCode::Char('G') => Action::Scroll(Motion::Bottom),
        KeyCode::Char('n') => Action::ToggleLowRated,
        _ => return None,
    };
    Some(action)
}

/// A feed list running in the terminal.
pub struct FeedProgram<R, F> {
    list: FeedList<R>,
    state: FeedState<R>,
    fetcher: F,
    options: ProgramOptions,
    window: WindowEvents,
    /// Geometry of the last drawn frame.
    geometry: TerminalViewport,
    scroll: FeedScroll,
    loading: LoadingIndicator,
    requests: mpsc::UnboundedReceiver<ItemRef>,
    pages_tx: mpsc::UnboundedSender<Fetched<R>>,
    pages_rx: mpsc::UnboundedReceiver<Fetched<R>>,
    in_flight: HashSet<Option<ItemRef>>,
    exhausted: bool,
    last_error: Option<String>,
    needs_redraw: bool,
    should_quit: bool,
}

impl<R, F> FeedProgram<R, F>
where
    R: Summary + Send + 'static,
    F: PageFetcher<R>,
{
    pub fn new(props: FeedProps<R>, state: FeedState<R>, options: ProgramOptions, fetcher: F) -> Self {
        Self::with_clock(props, state, options, fetcher, Rc::new(SystemClock))
    }

    /// Like [`new`](Self::new), with the debounce window measured on `clock`.
    pub fn with_clock(
        props: FeedProps<R>,
        state: FeedState<R>,
        options: ProgramOptions,
        fetcher: F,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let (request_tx, requests) = mpsc::unbounded_channel();
        let (pages_tx, pages_rx) = mpsc::unbounded_channel();
        let monitor = ViewportMonitor::new(options.monitor.clone(), clock);
        let mut list = FeedList::new(props, monitor)
            .with_load_more(PageRequests(request_tx))
            .with_viewer(state.viewer_settings());
        list.sync(&state);
        let geometry = TerminalViewport::new(0, 0)
            .with_metrics(options.metrics)
            .with_root_id(options.monitor.root_id.clone());

        Self {
            list,
            state,
            fetcher,
            options,
            window: WindowEvents::new(),
            geometry,
            scroll: FeedScroll::default(),
            loading: LoadingIndicator::new(),
            requests,
            pages_tx,
            pages_rx,
            in_flight: HashSet::new(),
            exhausted: false,
            last_error: None,
            needs_redraw: true,
            should_quit: false,
        }
    }

    pub fn list(&self) -> &FeedList<R> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut FeedList<R> {
        &mut self.list
    }

    pub fn state(&self) -> &FeedState<R> {
        &self.state
    }

    /// Mutate the state. Store changes are picked up through its revision
    /// channel; call [`resync`](Self::resync) after changing anything else.
    pub fn state_mut(&mut self) -> &mut FeedState<R> {
        &mut self.state
    }

    /// Re-read viewer settings and mutes from the state.
    pub fn resync(&mut self) {
        if self.list.sync(&self.state) {
            self.needs_redraw = true;
        }
    }

    /// Take over the terminal and run until the user quits.
    ///
    /// Returns the final state, including every page fetched.
    pub async fn run(mut self) -> Result<FeedState<R>, ProgramError> {
        let mut terminal = init_terminal(&self.options)?;
        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&self.options)?;
        result.map(|()| self.state)
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<(), ProgramError> {
        let handle = self.list.mount(&self.window);
        let mut events = EventStream::new();
        let mut revisions = WatchStream::new(self.state.content.subscribe());

        let fps = self.options.fps.clamp(1, 120);
        let mut frame_interval = tokio::time::interval(Duration::from_secs(1) / fps);
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut spinner = tokio::time::interval(self.loading.interval());
        spinner.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.request_first_page();

        let result = loop {
            if self.should_quit {
                break Ok(());
            }
            let deadline = self.list.monitor().deadline().map(Instant::from_std);

            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if self.options.handle_signals => {
                    self.should_quit = true;
                }

                event = events.next() => match event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(err)) => break Err(err.into()),
                    None => self.should_quit = true,
                },

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(|| Instant::now() + IDLE)),
                    if deadline.is_some() => {
                    self.poll_viewport();
                }

                Some(anchor) = self.requests.recv() => {
                    self.request_page(Some(anchor));
                }

                Some(fetched) = self.pages_rx.recv() => {
                    self.apply_fetched(fetched);
                }

                Some(_) = revisions.next() => {
                    self.resync();
                }

                _ = spinner.tick(), if self.list.props().loading => {
                    self.loading.tick();
                    self.needs_redraw = true;
                }

                _ = frame_interval.tick() => {
                    if self.needs_redraw {
                        if let Err(err) = terminal.draw(|frame| self.view(frame)) {
                            break Err(err.into());
                        }
                        self.needs_redraw = false;
                    }
                }
            }
        };

        let removed = self.list.unmount(handle, &self.window);
        tracing::debug!(removed, "feed listeners detached");
        result
    }

    /// Fetch the opening page of a reference list that starts empty.
    /// Materialised lists never paginate.
    fn request_first_page(&mut self) {
        if matches!(&self.list.props().source, FeedSource::References(refs) if refs.is_empty()) {
            self.request_page(None);
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key_action(key) {
                Some(Action::Quit) => self.should_quit = true,
                Some(Action::Scroll(motion)) => self.scroll(motion),
                Some(Action::ToggleLowRated) => {
                    let show = !self.list.show_negative_comments();
                    self.list.set_show_negative_comments(show);
                    self.needs_redraw = true;
                }
                None => {}
            },
            Event::Mouse(mouse) => {
                let step = self.options.scroll_step as isize;
                match mouse.kind {
                    MouseEventKind::ScrollDown => self.scroll(Motion::Rows(step)),
                    MouseEventKind::ScrollUp => self.scroll(Motion::Rows(-step)),
                    _ => {}
                }
            }
            Event::Resize(cols, rows) => {
                tracing::trace!(cols, rows, "terminal resized");
                self.needs_redraw = true;
                self.window.dispatch(EventKind::Resize);
            }
            _ => {}
        }
    }

    fn scroll(&mut self, motion: Motion) {
        let content = self.geometry.document_rows();
        let visible = usize::from(self.geometry.body_rows);
        let page = visible.saturating_sub(1).max(1) as isize;
        let moved = match motion {
            Motion::Rows(rows) => self.scroll.scroll_by(rows, content, visible),
            Motion::Pages(pages) => self.scroll.scroll_by(pages * page, content, visible),
            Motion::Top => self.scroll.to_top(),
            Motion::Bottom => self.scroll.to_bottom(content, visible),
        };
        if moved {
            self.geometry.scroll_rows = self.scroll.offset();
            self.needs_redraw = true;
            self.window.dispatch(EventKind::Scroll);
        }
    }

    fn poll_viewport(&mut self) {
        if let Some(evaluation) = self.list.poll(&self.geometry) {
            tracing::trace!(
                remaining_px = evaluation.remaining_px,
                near_bottom = evaluation.near_bottom,
                layout = ?evaluation.layout_mode,
                "viewport evaluated"
            );
            self.needs_redraw = true;
        }
    }

    /// Start fetching the page after `anchor` unless that page is already
    /// on its way or the feed has ended.
    fn request_page(&mut self, anchor: Option<ItemRef>) {
        if self.exhausted {
            tracing::debug!(anchor = ?anchor, "feed exhausted, ignoring page request");
            return;
        }
        if !self.in_flight.insert(anchor.clone()) {
            tracing::debug!(anchor = ?anchor, "page already in flight");
            return;
        }

        tracing::info!(anchor = ?anchor, "fetching page");
        let future = self.fetcher.fetch(anchor.clone());
        let tx = self.pages_tx.clone();
        tokio::spawn(async move {
            let result = future.await.map_err(|err| err.to_string());
            let _ = tx.send(Fetched { anchor, result });
        });
        self.update_loading();
    }

    fn apply_fetched(&mut self, fetched: Fetched<R>) {
        self.in_flight.remove(&fetched.anchor);
        match fetched.result {
            Ok(page) => {
                let count = page.items.len();
                let refs: Vec<ItemRef> = page.items.iter().map(|(item, _)| item.clone()).collect();
                self.state.content.extend(page.items);
                self.list.append_references(refs);
                self.list.sync(&self.state);
                if page.last || count == 0 {
                    self.exhausted = true;
                }
                self.last_error = None;
                tracing::info!(count, last = page.last, "page applied");
                // The list grew; check again whether the end is still in view.
                self.list.monitor().on_viewport_change();
            }
            Err(reason) => {
                tracing::warn!(anchor = ?fetched.anchor, %reason, "page fetch failed");
                self.last_error = Some(reason);
            }
        }
        self.update_loading();
    }

    fn update_loading(&mut self) {
        self.list.set_loading(!self.in_flight.is_empty());
        self.needs_redraw = true;
    }

    /// Draw the title bar, the scrolled feed and the status line, and record
    /// the geometry the next evaluation measures against.
    pub fn view(&mut self, frame: &mut Frame) {
        let [title_area, body, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let heading = self.heading();
        // Leave the last column to the scrollbar.
        let lines = FeedLines::build(
            &self.list.entries(&self.state.content),
            body.width.saturating_sub(1),
            &self.loading,
        )
        .with_header(heading);

        let visible = usize::from(body.height);
        self.scroll.clamp(lines.height(), visible);
        self.geometry.header_rows = lines.header_rows();
        self.geometry.list_rows = lines.list_rows();
        self.geometry.scroll_rows = self.scroll.offset();
        self.geometry.body_rows = body.height;
        self.geometry.cols = body.width;

        frame.render_widget(
            Paragraph::new(self.title_line())
                .style(Style::default().add_modifier(Modifier::REVERSED)),
            title_area,
        );
        frame.render_widget(FeedView::new(&lines, self.scroll), body);
        frame.render_widget(Paragraph::new(self.status_line()), status_area);
    }

    fn heading(&self) -> Vec<Line<'static>> {
        let props = self.list.props();
        let text = match (props.order.as_deref(), props.category.as_deref()) {
            (Some(order), Some(category)) => format!("{order} · #{category}"),
            (Some(order), None) => order.to_string(),
            (None, Some(category)) => format!("#{category}"),
            (None, None) => "Feed".to_string(),
        };
        vec![
            Line::styled(text, Style::default().add_modifier(Modifier::BOLD)),
            Line::default(),
        ]
    }

    fn title_line(&self) -> Line<'static> {
        let title = self.options.title.as_deref().unwrap_or("feedkit");
        Line::from(vec![
            Span::raw(format!(" {title} ")),
            Span::raw(" q quit · ↑↓ scroll · n low-rated"),
        ])
    }

    fn status_line(&self) -> Line<'static> {
        let mut parts = vec![format!(
            "{} shown",
            self.list.visible(&self.state.content).len()
        )];
        let missing = self.list.missing_count();
        if missing > 0 {
            parts.push(format!("{missing} missing"));
        }
        parts.push(
            match self.list.layout_mode() {
                LayoutMode::Compact => "compact",
                LayoutMode::Wide => "wide",
            }
            .to_string(),
        );
        if let Some(reason) = &self.last_error {
            parts.push(format!("fetch failed: {reason}"));
        } else if self.exhausted {
            parts.push("end of feed".to_string());
        }
        Line::styled(
            format!(" {}", parts.join(" · ")),
            Style::default().fg(Color::DarkGray),
        )
    }
}

fn init_terminal(options: &ProgramOptions) -> Result<Terminal<CrosstermBackend<Stdout>>, ProgramError> {
    // Install panic hook that restores terminal (only once to avoid stacking)
    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        let alt_screen = options.alt_screen;
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore_terminal_minimal(alt_screen);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut writer = stdout();
    if options.alt_screen {
        execute!(writer, EnterAlternateScreen)?;
    }
    if options.mouse_capture {
        execute!(writer, EnableMouseCapture)?;
    }
    if let Some(ref title) = options.title {
        execute!(writer, SetTitle(title))?;
    }
    execute!(writer, cursor::Hide)?;

    let terminal = Terminal::new(CrosstermBackend::new(writer))?;
    Ok(terminal)
}

fn restore_terminal(options: &ProgramOptions) -> Result<(), ProgramError> {
    restore_terminal_minimal(options.alt_screen)?;
    Ok(())
}

fn restore_terminal_minimal(alt_screen: bool) -> Result<(), std::io::Error> {
    // Best effort: keep restoring after individual failures.
    let raw = disable_raw_mode();
    let mut writer = stdout();
    execute!(writer, DisableMouseCapture).ok();
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedkit_core::debounce::ManualClock;
    use ratatui::backend::TestBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Post(String);

    impl Summary for Post {
        fn title(&self) -> &str {
            &self.0
        }
        fn author(&self) -> &str {
            "alice"
        }
    }

    fn item(i: usize) -> ItemRef {
        ItemRef::from_parts("@alice", &format!("post-{i}"))
    }

    fn page_after(after: Option<ItemRef>) -> Page<Post> {
        let start = after
            .as_ref()
            .and_then(|anchor| anchor.slug())
            .and_then(|slug| slug.strip_prefix("post-"))
            .and_then(|n| n.parse::<usize>().ok())
            .map_or(0, |n| n + 1);
        Page::new(
            (start..start + 5)
                .map(|i| (item(i), Post(format!("Post number {i}"))))
                .collect(),
        )
    }

    type Fetch = Box<dyn Fn(Option<ItemRef>) -> futures::future::Ready<Result<Page<Post>, String>>>;

    fn counting(
        calls: &Arc<AtomicUsize>,
        respond: impl Fn(Option<ItemRef>) -> Result<Page<Post>, String> + 'static,
    ) -> Fetch {
        let calls = Arc::clone(calls);
        Box::new(move |after| {
            calls.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(respond(after))
        })
    }

    fn program(fetch: Fetch) -> FeedProgram<Post, Fetch> {
        program_with_clock(fetch, Rc::new(ManualClock::new()))
    }

    fn program_with_clock(fetch: Fetch, clock: Rc<ManualClock>) -> FeedProgram<Post, Fetch> {
        let props = FeedProps::references(Vec::new())
            .with_category("photo")
            .with_order("trending");
        FeedProgram::with_clock(props, FeedState::new(), ProgramOptions::default(), fetch, clock)
    }

    async fn settle(program: &mut FeedProgram<Post, Fetch>) {
        let fetched = program.pages_rx.recv().await.unwrap();
        program.apply_fetched(fetched);
    }

    fn draw(program: &mut FeedProgram<Post, Fetch>, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| program.view(frame)).unwrap();
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..height {
            for x in 0..width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn keys_map_to_actions() {
        let key = |code, modifiers| KeyEvent::new(code, modifiers);

        assert_eq!(key_action(key(KeyCode::Char('q'), KeyModifiers::NONE)), Some(Action::Quit));
        assert_eq!(key_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Action::Quit));
        assert_eq!(key_action(key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(
            key_action(key(KeyCode::PageDown, KeyModifiers::NONE)),
            Some(Action::Scroll(Motion::Pages(1)))
        );
        assert_eq!(
            key_action(key(KeyCode::Char('G'), KeyModifiers::SHIFT)),
            Some(Action::Scroll(Motion::Bottom))
        );
        assert_eq!(
            key_action(key(KeyCode::Char('n'), KeyModifiers::NONE)),
            Some(Action::ToggleLowRated)
        );
    }

    #[tokio::test]
    async fn first_page_is_fetched_and_applied() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program = program(counting(&calls, |after| Ok(page_after(after))));

        program.request_page(None);
        assert!(program.list().props().loading);
        settle(&mut program).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!program.list().props().loading);
        assert_eq!(program.state().content.len(), 5);
        assert_eq!(program.list().anchor(), Some(&item(4)));
        assert_eq!(program.list().visible(&program.state().content).len(), 5);
    }

    #[tokio::test]
    async fn only_an_empty_reference_list_fetches_a_first_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut empty = program(counting(&calls, |after| Ok(page_after(after))));
        empty.request_first_page();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = Arc::new(AtomicUsize::new(0));
        let props = FeedProps::materialized(vec![Post("Pinned".to_string())]);
        let mut pinned = FeedProgram::with_clock(
            props,
            FeedState::new(),
            ProgramOptions::default(),
            counting(&calls, |after| Ok(page_after(after))),
            Rc::new(ManualClock::new()),
        );
        pinned.request_first_page();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!pinned.list().props().loading);

        let calls = Arc::new(AtomicUsize::new(0));
        let mut listed = FeedProgram::with_clock(
            FeedProps::references(vec![item(0)]),
            FeedState::new(),
            ProgramOptions::default(),
            counting(&calls, |after| Ok(page_after(after))),
            Rc::new(ManualClock::new()),
        );
        listed.request_first_page();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn page_in_flight_is_not_requested_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program = program(counting(&calls, |after| Ok(page_after(after))));

        program.request_page(Some(item(4)));
        program.request_page(Some(item(4)));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(program.in_flight.len(), 1);
        settle(&mut program).await;
        assert!(program.in_flight.is_empty());
    }

    #[tokio::test]
    async fn final_page_ends_the_feed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program = program(counting(&calls, |_| Ok(Page::final_page(Vec::new()))));

        program.request_page(None);
        settle(&mut program).await;
        program.request_page(None);

        assert!(program.exhausted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_fetch_can_be_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program = program(counting(&calls, |_| Err("offline".to_string())));

        program.request_page(None);
        settle(&mut program).await;

        assert_eq!(program.last_error.as_deref(), Some("offline"));
        assert!(!program.list().props().loading);
        program.request_page(None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn view_records_geometry_and_shows_status() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program = program(counting(&calls, |after| Ok(page_after(after))));
        program.request_page(None);
        settle(&mut program).await;

        let screen = draw(&mut program, 80, 12);

        assert!(screen.contains("trending · #photo"));
        assert!(screen.contains("Post number 0"));
        assert!(screen.contains("5 shown"));
        assert_eq!(program.geometry.header_rows, 2);
        assert_eq!(program.geometry.list_rows, 20);
        assert_eq!(program.geometry.body_rows, 10);
        assert_eq!(program.geometry.cols, 80);
    }

    #[tokio::test]
    async fn scrolling_schedules_an_evaluation() {
        let clock = Rc::new(ManualClock::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program =
            program_with_clock(counting(&calls, |after| Ok(page_after(after))), Rc::clone(&clock));
        let handle = program.list.mount(&program.window);
        program.request_page(None);
        settle(&mut program).await;
        draw(&mut program, 80, 12);
        clock.advance(Duration::from_millis(200));
        program.poll_viewport();
        assert!(!program.list().monitor().is_pending());

        program.handle_event(press(KeyCode::Up));
        assert!(!program.list().monitor().is_pending(), "already at the top");

        program.handle_event(press(KeyCode::Down));
        assert_eq!(program.scroll.offset(), 1);
        assert_eq!(program.geometry.scroll_rows, 1);
        assert!(program.list().monitor().is_pending());

        program.handle_event(press(KeyCode::Char('q')));
        assert!(program.should_quit);
        assert_eq!(program.list.unmount(handle, &program.window), 2);
    }

    #[tokio::test]
    async fn resize_schedules_an_evaluation() {
        let clock = Rc::new(ManualClock::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program =
            program_with_clock(counting(&calls, |after| Ok(page_after(after))), Rc::clone(&clock));
        let handle = program.list.mount(&program.window);
        clock.advance(Duration::from_millis(200));
        program.poll_viewport();

        program.handle_event(Event::Resize(60, 20));

        assert!(program.list().monitor().is_pending());
        program.list.unmount(handle, &program.window);
    }

    #[tokio::test]
    async fn reaching_the_end_requests_the_next_page() {
        let clock = Rc::new(ManualClock::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program =
            program_with_clock(counting(&calls, |after| Ok(page_after(after))), Rc::clone(&clock));
        let handle = program.list.mount(&program.window);
        program.request_page(None);
        settle(&mut program).await;
        // 22 document rows fit in a 28 row body.
        draw(&mut program, 80, 30);

        clock.advance(Duration::from_millis(200));
        program.poll_viewport();

        let anchor = program.requests.recv().await.unwrap();
        assert_eq!(anchor, item(4));
        program.request_page(Some(anchor));
        settle(&mut program).await;
        assert_eq!(program.list().anchor(), Some(&item(9)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        program.list.unmount(handle, &program.window);
    }

    #[tokio::test]
    async fn compact_terminal_switches_layout() {
        let clock = Rc::new(ManualClock::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut program =
            program_with_clock(counting(&calls, |after| Ok(page_after(after))), Rc::clone(&clock));
        let handle = program.list.mount(&program.window);
        draw(&mut program, 60, 12);

        clock.advance(Duration::from_millis(200));
        program.poll_viewport();

        assert_eq!(program.list().layout_mode(), LayoutMode::Compact);
        assert!(draw(&mut program, 60, 12).contains("compact"));
        program.list.unmount(handle, &program.window);
    }
}
