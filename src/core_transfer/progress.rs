use indicatif::{ProgressBar, ProgressStyle};

/// Cosmetic per-chunk progress bar. Purely display; never affects control
/// flow, and the disabled variant is a drop-in no-op.
pub struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    pub fn new(chunks: u64) -> Self {
        let bar = ProgressBar::new(chunks);
        let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} chunks ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }

    pub fn disabled() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
