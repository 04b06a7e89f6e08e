//! Byte progress for a single archive download.
//!
//! [`TransferProgress`] always logs what it sees (total size, chunk sizes,
//! final count). When asked to, it also renders an indicatif bar on stderr.
//! It finishes itself on drop, so the bar is cleaned up on error paths too.

use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Caller-supplied progress hook, invoked after every chunk with
/// `(bytes_downloaded, total_bytes)`. `total_bytes` is `None` when the server
/// sent no Content-Length.
pub type ProgressCallback = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

const BAR_TEMPLATE: &str =
    "{spinner:.blue} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const SPINNER_TEMPLATE: &str = "{spinner:.blue} [{elapsed_precise}] {bytes} ({bytes_per_sec})";

pub(crate) struct TransferProgress {
    total: Option<u64>,
    current: u64,
    bar: Option<ProgressBar>,
    callback: Option<ProgressCallback>,
    finished: bool,
}

impl TransferProgress {
    pub(crate) fn new(
        total: Option<u64>,
        show_bar: bool,
        callback: Option<ProgressCallback>,
    ) -> Self {
        // A zero Content-Length is treated like a missing one.
        let total = total.filter(|bytes| *bytes > 0);
        if let Some(bytes) = total {
            info!(total_bytes = bytes, "Total size: {bytes} bytes");
        }
        let bar = show_bar.then(|| new_bar(total));
        Self {
            total,
            current: 0,
            bar,
            callback,
            finished: false,
        }
    }

    pub(crate) fn update(&mut self, chunk_len: u64) {
        self.current = self.current.saturating_add(chunk_len);
        debug!(chunk_bytes = chunk_len, "Current chunk size: {chunk_len}");
        if let Some(bar) = &self.bar {
            bar.inc(chunk_len);
        }
        if let Some(callback) = &self.callback {
            callback(self.current, self.total);
        }
    }

    pub(crate) fn current(&self) -> u64 {
        self.current
    }

    pub(crate) fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        info!(bytes = self.current, "Downloaded {} bytes", self.current);
    }
}

impl Drop for TransferProgress {
    fn drop(&mut self) {
        self.finish();
    }
}

fn new_bar(total: Option<u64>) -> ProgressBar {
    match total {
        Some(len) => {
            let bar = ProgressBar::new(len);
            bar.set_style(
                ProgressStyle::with_template(BAR_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        }
        None => {
            let bar = ProgressBar::no_length();
            bar.set_style(
                ProgressStyle::with_template(SPINNER_TEMPLATE)
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        }
    }
}
