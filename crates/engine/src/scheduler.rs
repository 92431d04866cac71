use chrono::{Timelike, Utc};
use dashmap::DashMap;
use moor_mud_common::LocKey;
use moor_mud_events::{Event, EventKind};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use crate::engine::Engine;

/// Day or night, as observed by every authenticated session. Minutes `{0,10,20,30,40,50}` are night-entry; `{5,15,25,35,45,55}`
/// are day-entry.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TimePhase {
    Day,
    Night,
}

fn phase_for_minute(minute: u32) -> TimePhase {
    if (minute / 5) % 2 == 0 {
        TimePhase::Night
    } else {
        TimePhase::Day
    }
}

/// A named job registered against the wall-clock tick. The
/// admin surface lists/enables/disables these by name.
pub struct ScheduledJob {
    pub name: String,
    pub intervals: Vec<u8>,
    pub enabled: AtomicBool,
    pub run_count: AtomicU32,
    pub error_count: AtomicU32,
    pub last_run: RwLock<Option<chrono::DateTime<Utc>>>,
}

pub type JobHandler =
Arc<dyn Fn(Arc<Engine>) -> futures::future::BoxFuture<'static, ()> + Send + Sync>;

pub struct Scheduler {
    jobs: DashMap<String, (Arc<ScheduledJob>, JobHandler)>,
    time_phase: RwLock<TimePhase>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            time_phase: RwLock::new(TimePhase::Day),
        }
    }

    pub fn time_phase(&self) -> TimePhase {
        *self.time_phase.read().unwrap()
    }

    /// Registers a job that fires whenever the wall-clock tick second is in
    /// `intervals` (each one of `{0, 15, 30, 45}`).
    pub fn register_job(&self, name: impl Into<String>, intervals: Vec<u8>, handler: JobHandler) {
        let name = name.into();
        let job = Arc::new(ScheduledJob {
                name: name.clone(),
                intervals,
                enabled: AtomicBool::new(true),
                run_count: AtomicU32::new(0),
                error_count: AtomicU32::new(0),
                last_run: RwLock::new(None),
        });
        self.jobs.insert(name, (job, handler));
    }

    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        if let Some(entry) = self.jobs.get(name) {
            entry.0.enabled.store(enabled, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn list(&self) -> Vec<Arc<ScheduledJob>> {
        self.jobs.iter().map(|e| e.0.0.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ScheduledJob>> {
        self.jobs.get(name).map(|e| e.0.clone())
    }
}

/// Sleeps until the next wall-clock second in `{0, 15, 30, 45}`, publishes
/// `SchedulerTick(interval)`, and fires every enabled job whose intervals
/// include that second. Runs for the lifetime of the
/// process; the caller spawns it as its own task.
pub async fn run_tick_loop(engine: Arc<Engine>) {
    loop {
        let now = Utc::now();
        let second = now.second();
        let marks = [0u32, 15, 30, 45];
        let next_mark = marks
            .iter()
            .copied()
            .find(|m| *m > second)
            .unwrap_or(60 + marks[0]);
        let wait_secs = if next_mark >= 60 {
            (60 - second) + (next_mark - 60)
        } else {
            next_mark - second
        };
        tokio::time::sleep(std::time::Duration::from_secs(wait_secs.max(1) as u64)).await;

        let tick_second = (Utc::now().second() / 15 * 15) as u8;
        engine
            .bus
            .publish(Event::new(EventKind::SchedulerTick).with_interval(tick_second));

        for job_entry in engine.scheduler.jobs.iter() {
            let (job, handler) = job_entry.value().clone();
            if !job.enabled.load(Ordering::SeqCst) {
                continue;
            }
            if !job.intervals.contains(&tick_second) {
                continue;
            }
            *job.last_run.write().unwrap() = Some(Utc::now());
            job.run_count.fetch_add(1, Ordering::SeqCst);
            let engine = engine.clone();
            handler(engine).await;
        }
    }
}

/// Tracks wall-clock minute transitions and notifies every authenticated
/// session of dawn/dusk.
pub async fn run_day_night_loop(engine: Arc<Engine>) {
    let mut last_minute: Option<u32> = None;
    loop {
        let now = Utc::now();
        let minute = now.minute();
        if last_minute != Some(minute) {
            last_minute = Some(minute);
            let new_phase = phase_for_minute(minute);
            let changed = {
                let mut guard = engine.scheduler.time_phase.write().unwrap();
                let changed = *guard != new_phase;
                *guard = new_phase;
                changed
            };
            if changed {
                let key = match new_phase {
                    TimePhase::Day => "time.dawn",
                    TimePhase::Night => "time.dusk",
                };
                engine.broadcast.broadcast_to_all(LocKey::new(key));
            }
        }
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}
