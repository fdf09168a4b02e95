//! Generation metrics and logging setup.
//!
//! Counters are atomics so one collector can be shared across the rayon
//! workers of a population run.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Collector for derivation statistics.
pub struct Metrics {
    organisms_generated: AtomicU64,
    mutations_applied: AtomicU64,
    particles_allocated: AtomicU64,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("organisms_generated", &self.organisms_generated())
            .field("mutations_applied", &self.mutations_applied())
            .field("particles_allocated", &self.particles_allocated())
            .finish_non_exhaustive()
    }
}

impl Metrics {
    /// Creates a new metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            organisms_generated: AtomicU64::new(0),
            mutations_applied: AtomicU64::new(0),
            particles_allocated: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records one generated organism.
    pub fn record_organism(&self, block_number: u64, generation: u32) {
        let total = self.organisms_generated.fetch_add(1, Ordering::Relaxed) + 1;

        // Log at info level every 1000 organisms
        if total % 1000 == 0 {
            tracing::info!(
                organisms = total,
                block_number = block_number,
                generation = generation,
                "Organism generation progress"
            );
        }
    }

    /// Records a mutation pass that changed `applied` fields.
    pub fn record_mutations(&self, applied: usize) {
        self.mutations_applied
            .fetch_add(applied as u64, Ordering::Relaxed);
    }

    /// Records a completed allocation.
    pub fn record_allocation(&self, particles: usize, duration: Duration) {
        self.particles_allocated
            .fetch_add(particles as u64, Ordering::Relaxed);
        tracing::debug!(
            particles = particles,
            duration_ms = duration.as_millis() as u64,
            "Particle allocation"
        );
    }

    /// Increments a named counter.
    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value of a named counter.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn organisms_generated(&self) -> u64 {
        self.organisms_generated.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn mutations_applied(&self) -> u64 {
        self.mutations_applied.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn particles_allocated(&self) -> u64 {
        self.particles_allocated.load(Ordering::Relaxed)
    }

    /// Gets elapsed time since metrics creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honours `RUST_LOG`; defaults to `info`. Safe to call more than once.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .ok();
}
