// src/progress.rs
/// Lightweight progress reporting used by long-running operations (discovery,
/// parallel fetch, export). Frontends implement this to surface status to users.
///
/// Calls always come from the thread that started the run, never from workers.
pub trait Progress {
    /// Called at the start with the total number of targets.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One target resolved with data. `index` is its position in discovery order.
    fn item_done(&mut self, _index: usize, _name: &str) {}

    /// One target resolved without data; its record will be empty.
    fn item_failed(&mut self, _index: usize, _name: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// Prints one line per resolved target to stderr, `[done/total]` prefixed.
#[derive(Default)]
pub struct StderrProgress {
    total: usize,
    seen: usize,
}

impl Progress for StderrProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.seen = 0;
    }

    fn log(&mut self, msg: &str) {
        eprintln!("{msg}");
    }

    fn item_done(&mut self, _index: usize, name: &str) {
        self.seen += 1;
        eprintln!("[{}/{}] ✓ {name}", self.seen, self.total);
    }

    fn item_failed(&mut self, _index: usize, name: &str, reason: &str) {
        self.seen += 1;
        eprintln!("[{}/{}] ✗ {name}: {reason}", self.seen, self.total);
    }
}
