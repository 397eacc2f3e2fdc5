//! Progress reporting while the panel is working
//!
//! The orchestrator only ever notifies a [`ProgressObserver`]; how (or whether)
//! that is rendered is up to the observer. The spinner ticks on its own
//! interval, so a slow terminal never delays completion of a request.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Receives notifications about a request in flight
pub trait ProgressObserver: Send + Sync {
    /// Providers are about to be queried
    fn started(&self, _providers: &[&str]) {}

    /// One provider resolved (in completion order)
    fn provider_finished(&self, _index: usize, _name: &str, _success: bool) {}

    /// The judge is being consulted
    fn judging(&self, _judge: &str) {}

    /// The request is complete; clear anything drawn
    fn finished(&self) {}
}

/// Observer that ignores everything
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Terminal spinner on stderr
pub struct SpinnerProgress {
    bar: Mutex<Option<ProgressBar>>,
    total: AtomicUsize,
    done: AtomicUsize,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            total: AtomicUsize::new(0),
            done: AtomicUsize::new(0),
        }
    }

    /// Spinner when stderr is an interactive terminal, otherwise silence
    pub fn for_terminal(enabled: bool) -> Box<dyn ProgressObserver> {
        if should_spin(enabled, atty::is(atty::Stream::Stderr)) {
            Box::new(Self::new())
        } else {
            Box::new(NoProgress)
        }
    }

    fn set_message(&self, message: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.set_message(message);
            }
        }
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for SpinnerProgress {
    fn started(&self, providers: &[&str]) {
        self.total.store(providers.len(), Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);

        let bar = ProgressBar::new_spinner();
        let style = if supports_unicode() {
            ProgressStyle::default_spinner()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
                .template("{spinner} {msg} [{elapsed}]")
        } else {
            ProgressStyle::default_spinner()
                .tick_strings(&["|", "/", "-", "\\"])
                .template("{spinner} {msg} [{elapsed}]")
        };
        if let Ok(style) = style {
            bar.set_style(style);
        }
        bar.set_message(format!("Asking {}...", providers.join(", ")));
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(bar) {
                old.finish_and_clear();
            }
        }
    }

    fn provider_finished(&self, _index: usize, name: &str, success: bool) {
        let done = self.done.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.total.load(Ordering::SeqCst);
        let verb = if success { "answered" } else { "failed" };
        self.set_message(format!("{} {} ({}/{})", name, verb, done, total));
    }

    fn judging(&self, judge: &str) {
        self.set_message(format!("{} is judging the answers...", judge));
    }

    fn finished(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

/// Color preferences never hide the spinner, only the setting and a TTY do
fn should_spin(enabled: bool, stderr_is_tty: bool) -> bool {
    enabled && stderr_is_tty
}

fn supports_unicode() -> bool {
    std::env::var("LANG")
        .or_else(|_| std::env::var("LC_ALL"))
        .map(|val| val.to_lowercase().contains("utf"))
        .unwrap_or(true)
}
