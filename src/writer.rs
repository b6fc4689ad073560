//! Per-`(temp_dir, format)` append-only writer with timer-driven rotation into
//! a destination directory.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Local;
use log::{error, info};

use crate::queue::BatchQueue;

const STUCK_COOLDOWN: Duration = Duration::from_secs(60);
const WRITE_BUFFER_CAPACITY: usize = 1024 * 1024;

struct WriterState {
    file: Option<BufWriter<File>>,
    stuck: bool,
    stuck_since: Option<Instant>,
}

pub struct Writer {
    temp_path: PathBuf,
    dest_dir: PathBuf,
    format: String,
    rotate_every: Duration,
    q2: Arc<BatchQueue<Vec<u8>>>,
    state: Mutex<WriterState>,
}

fn rotated_filename(format: &str) -> String {
    let now = Local::now();
    let offset_hours = now.offset().local_minus_utc() / 3600;
    format!("{}.{}_{}{:+03}00", format, now.format("%Y%m%d"), now.format("%H:%M:%S"), offset_hours)
}

impl Writer {
    pub fn new(temp_dir: PathBuf, dest_dir: PathBuf, format: impl Into<String>, rotate_every: Duration, q2: Arc<BatchQueue<Vec<u8>>>) -> Self {
        let format = format.into();
        let temp_path = temp_dir.join(format!("{}.current", format));
        Writer { temp_path, dest_dir, format, rotate_every, q2, state: Mutex::new(WriterState { file: None, stuck: false, stuck_since: None }) }
    }

    pub fn run(&self) {
        let mut next_rotation = Instant::now() + self.rotate_every;

        loop {
            let remaining = next_rotation.saturating_duration_since(Instant::now());
            let batch = self.q2.get_timeout(remaining);

            if batch.is_empty() {
                if Instant::now() >= next_rotation {
                    self.rotate();
                    next_rotation = Instant::now() + self.rotate_every;
                }
                continue;
            }

            let stopping = self.process_batch(&batch);
            if stopping {
                self.rotate();
                info!("writer {:?} stopped", self.temp_path);
                return;
            }
        }
    }

    /// Returns true if the batch carried the shutdown sentinel (an empty item).
    fn process_batch(&self, batch: &std::collections::VecDeque<Vec<u8>>) -> bool {
        let mut state = self.state.lock().unwrap();
        self.clear_stuck_if_cooled_down(&mut state);
        self.open_if_needed(&mut state);

        let mut stopping = false;
        for item in batch {
            if item.is_empty() {
                stopping = true;
                break;
            }
            if state.stuck {
                continue; // best-effort: upstream must not block on a stuck writer
            }
            if let Some(file) = state.file.as_mut() {
                if let Err(e) = file.write_all(item) {
                    error!("writer {:?} write failed, entering backoff: {}", self.temp_path, e);
                    state.stuck = true;
                    state.stuck_since = Some(Instant::now());
                }
            }
        }
        stopping
    }

    fn clear_stuck_if_cooled_down(&self, state: &mut WriterState) {
        if state.stuck {
            if let Some(since) = state.stuck_since {
                if since.elapsed() >= STUCK_COOLDOWN {
                    state.stuck = false;
                    state.stuck_since = None;
                }
            }
        }
    }

    fn open_if_needed(&self, state: &mut WriterState) {
        if state.file.is_some() || state.stuck {
            return;
        }
        match OpenOptions::new().create(true).append(true).open(&self.temp_path) {
            Ok(f) => state.file = Some(BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, f)),
            Err(e) => {
                error!("writer {:?} failed to open temp file, entering backoff: {}", self.temp_path, e);
                state.stuck = true;
                state.stuck_since = Some(Instant::now());
            }
        }
    }

    /// Closes the temp file (flushing first) and renames it into `dest_dir`. A
    /// no-op if no temp file is currently open, so an empty rotation period
    /// produces no destination file.
    fn rotate(&self) {
        let mut state = self.state.lock().unwrap();
        let mut file = match state.file.take() {
            Some(f) => f,
            None => return,
        };

        if let Err(e) = file.flush() {
            error!("writer {:?} failed to flush before rotation: {}", self.temp_path, e);
        }
        drop(file);

        let dest_path = self.dest_dir.join(rotated_filename(&self.format));
        match fs::rename(&self.temp_path, &dest_path) {
            Ok(()) => info!("rotated {:?} -> {:?}", self.temp_path, dest_path),
            Err(e) => error!("writer {:?} failed to rotate into {:?}: {}", self.temp_path, dest_path, e),
        }
    }
}
