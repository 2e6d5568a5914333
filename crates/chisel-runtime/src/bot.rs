//! The bot event loop.
//!
//! A [`Bot`] owns an ordered command registry and turns a stream of event
//! batches into dispatch rounds:
//!
//! ```text
//! EventSource ──batch──▶ Bot::run ──spawn per event──▶ dispatch ──▶ Reporter
//!                            │                             │
//!                            └── on_<type> signal          └── post_event_handling
//! ```
//!
//! Each event is handled in its own task; the loop never waits for a
//! previous event to finish before accepting the next one. The `on_<type>`
//! signal runs in a task of its own and is never awaited by the event.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::signal;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, warn};

use chisel_core::{BoxedEvent, HandlingStatus};
use chisel_framework::{Command, CommandBuilder, Dispatcher, dispatch};

use crate::config::{BotSettings, ChiselConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::report::{FailureReporter, Reporter, TracingReporter};
use crate::signal::{NoSignals, ReservedSignal, SignalDispatcher, SignalPayload, event_signal};
use crate::source::EventSource;

/// Decides whether an event's handling is shown by the reporter.
pub type DebugFilter = Arc<dyn Fn(&BoxedEvent) -> bool + Send + Sync>;

struct BotInner {
    registry: RwLock<Dispatcher>,
    reporter: Arc<dyn Reporter>,
    failure_reporter: Arc<dyn Reporter>,
    signals: Arc<dyn SignalDispatcher>,
    settings: BotSettings,
    debug_filter: DebugFilter,
    /// `None` while the bot is not accepting events.
    waiters: Mutex<Option<Vec<oneshot::Sender<BoxedEvent>>>>,
    shutdown: CancellationToken,
    running: AtomicBool,
    /// Event and signal tasks, drained when the loop stops.
    tasks: TaskTracker,
}

/// A command bot.
///
/// Cloning is cheap; every clone drives the same registry.
///
/// ```rust,ignore
/// let bot = Bot::builder().settings(config.bot).build();
/// bot.add_command(
///     bot.command("sum")
///         .argument("numbers", ListCutter::new(ListConfig::of(FloatCutter::new()))?)
///         .reaction(sum)
///         .build()?,
/// );
/// bot.run(source).await?;
/// ```
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::new()
    }

    /// Builder with settings taken from a loaded configuration.
    pub fn from_config(config: &ChiselConfig) -> BotBuilder {
        BotBuilder::new().settings(config.bot.clone())
    }

    pub fn settings(&self) -> &BotSettings {
        &self.inner.settings
    }

    pub fn is_release(&self) -> bool {
        self.inner.settings.release
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Command registry
    // =========================================================================

    /// Starts a command invoked as `name` behind the configured prefixes.
    ///
    /// More names can be added with [`CommandBuilder::names`].
    pub fn command(&self, name: impl Into<String>) -> CommandBuilder {
        let name = name.into();
        CommandBuilder::new(name.clone())
            .names([name])
            .prefixes(self.inner.settings.prefixes.iter().cloned())
    }

    /// Appends a command. Commands are evaluated concurrently but their
    /// statuses are reported in registration order.
    pub fn add_command(&self, command: Command) {
        debug!(command = command.name(), "Registering command");
        self.inner.registry.write().add(command);
    }

    /// Removes every command called `name`, returning how many were removed.
    pub fn remove_command(&self, name: &str) -> usize {
        self.inner.registry.write().remove(name)
    }

    /// Snapshot of the registered commands.
    pub fn commands(&self) -> Vec<Command> {
        self.inner.registry.read().commands().to_vec()
    }

    pub fn command_count(&self) -> usize {
        self.inner.registry.read().len()
    }

    /// A handle that does not keep the bot alive; safe to capture in
    /// reactions.
    pub fn handle(&self) -> BotHandle {
        BotHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // =========================================================================
    // Event handling
    // =========================================================================

    /// Runs one event through every registered command.
    ///
    /// The registry is snapshotted first, so commands added or removed
    /// meanwhile only affect later events. The `on_<type>` signal is started
    /// alongside and not awaited.
    pub async fn handle_event(&self, event: BoxedEvent) -> Arc<[HandlingStatus]> {
        let commands = self.commands();
        self.notify_event_type(&event);

        let statuses: Arc<[HandlingStatus]> = dispatch(event.clone(), &commands).await.into();

        self.report(&event, &statuses);

        self.inner
            .signals
            .emit(
                ReservedSignal::PostEventHandling.as_str(),
                SignalPayload::Handled {
                    event,
                    statuses: statuses.clone(),
                },
            )
            .await;

        statuses
    }

    fn notify_event_type(&self, event: &BoxedEvent) {
        let signals = self.inner.signals.clone();
        let name = event_signal(event.event_type());
        let payload = SignalPayload::Event(event.clone());
        self.inner
            .tasks
            .spawn(async move { signals.emit(&name, payload).await }.in_current_span());
    }

    fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]) {
        if self.inner.settings.release {
            self.inner.failure_reporter.report(event, statuses);
        } else if (self.inner.debug_filter)(event) {
            self.inner.reporter.report(event, statuses);
        }
    }

    /// Resolves with the next event the running bot receives.
    ///
    /// The waiter is registered when this is called, not when the future is
    /// first polled. Resolves to `None` if the bot is not running or stops
    /// before another event arrives.
    pub fn fetch_new_event(
        &self,
    ) -> impl Future<Output = Option<BoxedEvent>> + Send + 'static + use<> {
        let receiver = self.inner.waiters.lock().as_mut().map(|waiters| {
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            rx
        });

        async move { receiver?.await.ok() }
    }

    fn wake_waiters(&self, event: &BoxedEvent) {
        let waiters = match self.inner.waiters.lock().as_mut() {
            Some(waiters) => std::mem::take(waiters),
            None => return,
        };
        for waiter in waiters {
            let _ = waiter.send(event.clone());
        }
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Asks the running loop to stop. A bot that was shut down stays down.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    /// Pulls batches from `source` until it ends or [`Bot::shutdown`] is
    /// called, then waits for in-flight events to finish.
    ///
    /// `startup` is signalled first and `shutdown` last, also when the
    /// source fails.
    pub async fn run<S: EventSource>(&self, mut source: S) -> RuntimeResult<()> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::AlreadyRunning);
        }
        *self.inner.waiters.lock() = Some(Vec::new());

        info!(
            commands = self.command_count(),
            release = self.is_release(),
            "Bot started"
        );
        self.inner
            .signals
            .emit(ReservedSignal::Startup.as_str(), SignalPayload::None)
            .await;

        let result = self.listen(&mut source).await;

        self.inner
            .signals
            .emit(ReservedSignal::Shutdown.as_str(), SignalPayload::None)
            .await;
        self.inner.running.store(false, Ordering::SeqCst);
        info!("Bot stopped");

        result
    }

    async fn listen<S: EventSource>(&self, source: &mut S) -> RuntimeResult<()> {
        let tracker = &self.inner.tasks;
        tracker.reopen();
        let shutdown = self.inner.shutdown.clone();

        let result = loop {
            let batch = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                batch = source.next_batch() => batch,
            };

            match batch {
                Ok(Some(events)) => {
                    debug!(events = events.len(), "Received batch");
                    for event in events {
                        self.accept(event, tracker);
                    }
                }
                Ok(None) => {
                    info!("Event source exhausted");
                    break Ok(());
                }
                Err(err) => {
                    error!(error = %err, "Event source failed");
                    break Err(RuntimeError::Source(err));
                }
            }
        };

        // Dropping the waiters releases reactions blocked on the next event,
        // otherwise draining the tracker could wait forever.
        self.inner.waiters.lock().take();
        tracker.close();
        tracker.wait().await;

        result
    }

    fn accept(&self, event: BoxedEvent, tracker: &TaskTracker) {
        self.wake_waiters(&event);

        let bot = self.clone();
        let span = tracing::debug_span!("event", event_type = event.event_type());
        tracker.spawn(
            async move {
                let event_type = event.event_type().to_string();
                let outcome = AssertUnwindSafe(bot.handle_event(event))
                    .catch_unwind()
                    .await;
                if let Err(panic) = outcome {
                    error!(
                        event_type = %event_type,
                        "Event handling panicked: {}",
                        panic_message(panic.as_ref())
                    );
                }
            }
            .instrument(span),
        );
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("settings", &self.inner.settings)
            .field("commands", &self.command_count())
            .field("running", &self.is_running())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// BotHandle
// =============================================================================

/// A weak reference to a [`Bot`].
#[derive(Clone)]
pub struct BotHandle {
    inner: Weak<BotInner>,
}

impl BotHandle {
    pub fn upgrade(&self) -> Option<Bot> {
        self.inner.upgrade().map(|inner| Bot { inner })
    }

    /// See [`Bot::fetch_new_event`].
    pub fn fetch_new_event(
        &self,
    ) -> impl Future<Output = Option<BoxedEvent>> + Send + 'static + use<> {
        let pending = self.upgrade().map(|bot| bot.fetch_new_event());
        async move { pending?.await }
    }

    pub fn shutdown(&self) {
        if let Some(bot) = self.upgrade() {
            bot.shutdown();
        }
    }
}

impl fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

// =============================================================================
// BotBuilder
// =============================================================================

/// Builder for [`Bot`].
pub struct BotBuilder {
    settings: BotSettings,
    reporter: Option<Arc<dyn Reporter>>,
    failure_reporter: Option<Arc<dyn Reporter>>,
    signals: Option<Arc<dyn SignalDispatcher>>,
    debug_filter: Option<DebugFilter>,
    commands: Vec<Command>,
}

impl Default for BotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BotBuilder {
    pub fn new() -> Self {
        Self {
            settings: BotSettings::default(),
            reporter: None,
            failure_reporter: None,
            signals: None,
            debug_filter: None,
            commands: Vec::new(),
        }
    }

    pub fn settings(mut self, settings: BotSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn release(mut self, release: bool) -> Self {
        self.settings.release = release;
        self
    }

    /// Reporter used outside release mode. Defaults to [`TracingReporter`].
    pub fn reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Reporter used in release mode. Defaults to [`FailureReporter`].
    pub fn failure_reporter<R: Reporter + 'static>(mut self, reporter: R) -> Self {
        self.failure_reporter = Some(Arc::new(reporter));
        self
    }

    pub fn signals<S: SignalDispatcher + 'static>(mut self, signals: S) -> Self {
        self.signals = Some(Arc::new(signals));
        self
    }

    /// Overrides the default filter, which accepts the configured
    /// `debug_event_types`.
    pub fn debug_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&BoxedEvent) -> bool + Send + Sync + 'static,
    {
        self.debug_filter = Some(Arc::new(filter));
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn build(self) -> Bot {
        let debug_filter = self.debug_filter.unwrap_or_else(|| {
            let types = self.settings.debug_event_types.clone();
            let filter: DebugFilter =
                Arc::new(move |event: &BoxedEvent| types.iter().any(|t| t == event.event_type()));
            filter
        });

        let registry = self
            .commands
            .into_iter()
            .fold(Dispatcher::new(), Dispatcher::with);

        Bot {
            inner: Arc::new(BotInner {
                registry: RwLock::new(registry),
                reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
                failure_reporter: self
                    .failure_reporter
                    .unwrap_or_else(|| Arc::new(FailureReporter)),
                signals: self.signals.unwrap_or_else(|| Arc::new(NoSignals)),
                settings: self.settings,
                debug_filter,
                waiters: Mutex::new(None),
                shutdown: CancellationToken::new(),
                running: AtomicBool::new(false),
                tasks: TaskTracker::new(),
            }),
        }
    }
}

// =============================================================================
// Process signals
// =============================================================================

/// Resolves on Ctrl+C or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to register SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(err) => error!(error = %err, "Failed to listen for Ctrl+C"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chisel_core::{Decision, TextEvent};
    use chisel_framework::{BoxError, CommandContext, FnFilter, StringCutter};

    use super::*;
    use crate::signal::SignalHub;
    use crate::source::channel;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl Recorder {
        fn texts(&self) -> Vec<String> {
            self.seen.lock().iter().map(|(t, _)| t.clone()).collect()
        }
    }

    impl Reporter for Recorder {
        fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]) {
            let handlers = statuses.iter().map(|s| s.handler().to_string()).collect();
            self.seen
                .lock()
                .push((event.text_or_empty().to_string(), handlers));
        }
    }

    fn ping(bot: &Bot) -> Command {
        bot.command("ping").reaction(|| async {}).build().unwrap()
    }

    fn message(text: &str) -> BoxedEvent {
        BoxedEvent::new(TextEvent::message(text))
    }

    fn recording_hub() -> (SignalHub, Arc<Mutex<Vec<String>>>) {
        let hub = SignalHub::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for name in [
            "startup",
            "shutdown",
            "post_event_handling",
            "on_message_new",
        ] {
            let log = log.clone();
            hub.on(name, move |_| {
                let log = log.clone();
                async move {
                    log.lock().push(name.to_string());
                }
            });
        }
        (hub, log)
    }

    #[tokio::test]
    async fn test_run_emits_lifecycle_signals() {
        let (hub, log) = recording_hub();
        let bot = Bot::builder().signals(hub).build();
        bot.add_command(ping(&bot));

        let (tx, source) = channel(8);
        tx.send(message("/ping")).await.unwrap();
        drop(tx);

        bot.run(source).await.unwrap();

        // The event-type signal runs detached, so only its presence between
        // startup and shutdown is fixed.
        let log = log.lock().clone();
        assert_eq!(log.len(), 4);
        assert_eq!(log.first().map(String::as_str), Some("startup"));
        assert_eq!(log.last().map(String::as_str), Some("shutdown"));
        let mut middle = log[1..3].to_vec();
        middle.sort();
        assert_eq!(middle, ["on_message_new", "post_event_handling"]);
        assert!(!bot.is_running());
    }

    #[tokio::test]
    async fn test_hung_event_signal_does_not_block_handling() {
        let hub = SignalHub::new();
        hub.on("on_message_new", |_| std::future::pending::<()>());
        let handled = Arc::new(Mutex::new(0));
        let counter = handled.clone();
        hub.on("post_event_handling", move |_| {
            let counter = counter.clone();
            async move {
                *counter.lock() += 1;
            }
        });
        let bot = Bot::builder().signals(hub).build();
        bot.add_command(ping(&bot));

        let statuses = tokio::time::timeout(
            Duration::from_millis(300),
            bot.handle_event(message("/ping")),
        )
        .await
        .expect("handling waited on the event-type signal");

        assert!(statuses[0].succeeded());
        assert_eq!(*handled.lock(), 1);
    }

    #[tokio::test]
    async fn test_panicking_event_signal_keeps_post_signal() {
        let hub = SignalHub::new();
        hub.on("on_message_new", |_| async {
            panic!("handler bug");
        });
        let (post_tx, mut post_rx) = tokio::sync::mpsc::unbounded_channel();
        hub.on("post_event_handling", move |_| {
            let post_tx = post_tx.clone();
            async move {
                let _ = post_tx.send(());
            }
        });
        let bot = Bot::builder().signals(hub).build();

        bot.handle_event(message("/ping")).await;

        assert!(post_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_reporter_sees_statuses_in_registration_order() {
        let recorder = Arc::new(Recorder::default());
        let bot = Bot::builder().reporter(recorder.clone()).build();
        bot.add_command(ping(&bot));
        bot.add_command(
            bot.command("echo")
                .argument("text", StringCutter::new())
                .reaction(|| async {})
                .build()
                .unwrap(),
        );

        let statuses = bot.handle_event(message("/echo hi")).await;

        assert_eq!(statuses.len(), 2);
        assert!(!statuses[0].all_filters_passed());
        assert!(statuses[1].all_filters_passed());
        assert_eq!(
            recorder.seen.lock()[0].1,
            vec!["ping".to_string(), "echo".to_string()]
        );
    }

    #[tokio::test]
    async fn test_release_mode_uses_failure_reporter() {
        let debug = Arc::new(Recorder::default());
        let failures = Arc::new(Recorder::default());
        let bot = Bot::builder()
            .release(true)
            .reporter(debug.clone())
            .failure_reporter(failures.clone())
            .build();
        bot.add_command(ping(&bot));

        bot.handle_event(message("/ping")).await;

        assert!(debug.seen.lock().is_empty());
        assert_eq!(failures.texts(), ["/ping"]);
    }

    #[tokio::test]
    async fn test_debug_filter_limits_reports_not_signals() {
        let (hub, log) = recording_hub();
        let recorder = Arc::new(Recorder::default());
        let bot = Bot::builder()
            .reporter(recorder.clone())
            .signals(hub)
            .debug_filter(|event| event.text_or_empty().starts_with('/'))
            .build();
        bot.add_command(ping(&bot));

        bot.handle_event(message("hello")).await;
        bot.handle_event(message("/ping")).await;

        assert_eq!(recorder.texts(), ["/ping"]);
        assert_eq!(
            log.lock()
                .iter()
                .filter(|s| *s == "post_event_handling")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_default_debug_filter_uses_settings() {
        let recorder = Arc::new(Recorder::default());
        let bot = Bot::builder().reporter(recorder.clone()).build();

        bot.handle_event(BoxedEvent::new(TextEvent::new("wall_post_new")))
            .await;
        bot.handle_event(BoxedEvent::new(TextEvent::new("message_edit")))
            .await;

        assert_eq!(recorder.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_command_uses_configured_prefixes() {
        let settings = BotSettings {
            prefixes: vec!["!".to_string()],
            ..Default::default()
        };
        let bot = Bot::builder().settings(settings).build();
        bot.add_command(ping(&bot));

        let statuses = bot.handle_event(message("!ping")).await;
        assert!(statuses[0].all_filters_passed());

        let statuses = bot.handle_event(message("/ping")).await;
        assert!(!statuses[0].all_filters_passed());
    }

    #[tokio::test]
    async fn test_registry_changes_apply_to_later_events() {
        let bot = Bot::builder().build();
        bot.add_command(ping(&bot));
        bot.add_command(ping(&bot));
        assert_eq!(bot.command_count(), 2);

        assert_eq!(bot.remove_command("ping"), 2);
        let statuses = bot.handle_event(message("/ping")).await;

        assert!(statuses.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_new_event_continues_conversation() {
        let bot = Bot::builder().build();
        let handle = bot.handle();
        let (asked_tx, mut asked_rx) = tokio::sync::mpsc::channel::<()>(1);
        let (answer_tx, mut answer_rx) = tokio::sync::mpsc::channel::<String>(1);

        bot.add_command(
            bot.command("ask")
                .reaction(move |_ctx: CommandContext| {
                    let handle = handle.clone();
                    let asked_tx = asked_tx.clone();
                    let answer_tx = answer_tx.clone();
                    async move {
                        let next = handle.fetch_new_event();
                        asked_tx.send(()).await?;
                        let reply = next.await.ok_or("bot stopped")?;
                        answer_tx.send(reply.text_or_empty().to_string()).await?;
                        Ok::<(), BoxError>(())
                    }
                })
                .build()
                .unwrap(),
        );

        let (tx, source) = channel(8);
        let runner = tokio::spawn({
            let bot = bot.clone();
            async move { bot.run(source).await }
        });

        tx.send(message("/ask")).await.unwrap();
        asked_rx.recv().await.unwrap();
        tx.send(message("forty two")).await.unwrap();

        assert_eq!(answer_rx.recv().await.unwrap(), "forty two");

        drop(tx);
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_fetch_new_event_outside_run_is_none() {
        let bot = Bot::builder().build();
        assert!(bot.fetch_new_event().await.is_none());
    }

    #[tokio::test]
    async fn test_panicking_batch_does_not_stop_loop() {
        struct Fragile(Arc<Recorder>);

        impl Reporter for Fragile {
            fn report(&self, event: &BoxedEvent, statuses: &[HandlingStatus]) {
                if event.text_or_empty() == "boom" {
                    panic!("reporter exploded");
                }
                self.0.report(event, statuses);
            }
        }

        let recorder = Arc::new(Recorder::default());
        let bot = Bot::builder()
            .reporter(Fragile(recorder.clone()))
            .build();

        let (tx, source) = channel(8);
        tx.send(message("boom")).await.unwrap();
        tx.send(message("fine")).await.unwrap();
        drop(tx);

        bot.run(source).await.unwrap();

        assert_eq!(recorder.texts(), ["fine"]);
    }

    #[tokio::test]
    async fn test_source_error_stops_run_after_shutdown_signal() {
        struct Broken;

        #[async_trait]
        impl EventSource for Broken {
            async fn next_batch(&mut self) -> Result<Option<Vec<BoxedEvent>>, BoxError> {
                Err("connection reset".into())
            }
        }

        let (hub, log) = recording_hub();
        let bot = Bot::builder().signals(hub).build();

        let result = bot.run(Broken).await;

        assert!(matches!(result, Err(RuntimeError::Source(_))));
        assert_eq!(*log.lock(), ["startup", "shutdown"]);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected_and_shutdown_stops_first() {
        let bot = Bot::builder().build();
        let (tx, source) = channel(8);
        let runner = tokio::spawn({
            let bot = bot.clone();
            async move { bot.run(source).await }
        });

        while !bot.is_running() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let (_tx2, second) = channel(1);
        assert!(matches!(
            bot.run(second).await,
            Err(RuntimeError::AlreadyRunning)
        ));

        bot.handle().shutdown();
        runner.await.unwrap().unwrap();
        drop(tx);
    }

    #[tokio::test]
    async fn test_failing_filter_recorded_without_stopping_others() {
        let bot = Bot::builder().build();
        bot.add_command(
            bot.command("guarded")
                .filter(FnFilter::new("never", |_| Decision::fail("closed")))
                .reaction(|| async {})
                .build()
                .unwrap(),
        );
        bot.add_command(ping(&bot));

        let statuses = bot.handle_event(message("/ping")).await;

        assert!(!statuses[0].all_filters_passed());
        assert!(statuses[1].all_filters_passed());
    }
}
