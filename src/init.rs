use crate::buffer::LogBuffer;
use crate::config::BufferConfig;
use crate::dispatch::Dispatcher;
use crate::layer::BufferLayer;
use crate::shutdown::ShutdownCoordinator;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Options for [`init_with_options`].
///
/// **Fields**
/// - `buffer`: flush threshold and trace depth of the underlying
///   [`LogBuffer`].
/// - `capture_level`: most verbose `tracing` level forwarded into the
///   buffer.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt` layer is
///   stacked on top of the buffer layer so events also reach the
///   console.
#[derive(Clone, Debug)]
pub struct InitOptions {
    pub buffer: BufferConfig,
    pub capture_level: tracing::Level,
    pub enable_stdout: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            buffer: BufferConfig::default(),
            capture_level: tracing::Level::ERROR,
            enable_stdout: true,
        }
    }
}

/// Build a [`LogBuffer`] around `dispatcher` and install a global
/// `tracing` subscriber that feeds it.
///
/// Returns the buffer so the application can emit profiling markers
/// and run explicit flushes; the returned handle shares state with the
/// installed layer.
pub fn init_with_options(dispatcher: Arc<dyn Dispatcher>, options: InitOptions) -> Arc<LogBuffer> {
    let buffer = Arc::new(LogBuffer::with_dispatcher(options.buffer, dispatcher));
    let layer = BufferLayer::new(Arc::clone(&buffer), options.capture_level);

    // The two arms build differently-typed subscribers, so the
    // set_global_default call is duplicated.
    if options.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }

    buffer
}

/// [`init_with_options`] with defaults: flush threshold 100, trace
/// depth 10, errors only, console echo on.
pub fn init(dispatcher: Arc<dyn Dispatcher>) -> Arc<LogBuffer> {
    init_with_options(dispatcher, InitOptions::default())
}

/// Like [`init_with_options`], additionally registering the two-phase
/// final flush on `coordinator` so the buffer is drained after every
/// other exit hook. Call before other components register their own
/// hooks.
pub fn init_with_shutdown(
    dispatcher: Arc<dyn Dispatcher>,
    options: InitOptions,
    coordinator: &Arc<ShutdownCoordinator>,
) -> Arc<LogBuffer> {
    let buffer = init_with_options(dispatcher, options);
    coordinator.install(Arc::clone(&buffer));
    buffer
}
