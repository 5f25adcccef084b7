use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{debug, error, info};

use crate::alarm::{SharedState, Tick};

/// how often the poller wakes up to look at the clock
pub const POLL_INTERVAL: Duration = Duration::from_millis(800);

/// Cooperative stop flag shared between a poller and whoever started it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// what firing an alarm does (sound and popup)
pub trait Fire: Send + Sync + 'static {
    fn fire(&self, sound: &Path);
}

struct Worker {
    token: CancelToken,
    handle: JoinHandle<()>,
}

/// Runs at most one polling thread over the shared alarm state.
pub struct Scheduler<F: Fire> {
    state: SharedState,
    alerter: Arc<F>,
    interval: Duration,
    now: fn() -> chrono::NaiveDateTime,
    worker: Option<Worker>,
}

fn local_now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

impl<F: Fire> Scheduler<F> {
    pub fn new(state: SharedState, alerter: Arc<F>) -> Self {
        Self {
            state,
            alerter,
            interval: POLL_INTERVAL,
            now: local_now,
            worker: None,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, now: fn() -> chrono::NaiveDateTime) -> Self {
        self.set_clock(now);
        self
    }

    /// only affects pollers started after this call
    pub fn set_clock(&mut self, now: fn() -> chrono::NaiveDateTime) {
        self.now = now;
    }

    pub fn alerter(&self) -> &F {
        &self.alerter
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.token.is_cancelled() && !worker.handle.is_finished())
    }

    /// starts a poller unless one is already alive
    pub fn ensure_running(&mut self) {
        if self.is_running() {
            return;
        }
        // a cancelled worker may still be asleep, it exits on its own
        self.worker = None;
        let token = CancelToken::new();
        let state = self.state.clone();
        let alerter = Arc::clone(&self.alerter);
        let interval = self.interval;
        let now = self.now;
        let worker_token = token.clone();
        let spawned = thread::Builder::new()
            .name("alarm poller".to_string())
            .spawn(move || poll(&state, alerter.as_ref(), &worker_token, interval, now));
        match spawned {
            Ok(handle) => {
                debug!("alarm poller started");
                self.worker = Some(Worker { token, handle });
            }
            Err(e) => error!("couldn't start alarm poller: {e}"),
        }
    }

    pub fn pause(&mut self) {
        if let Some(worker) = &self.worker {
            worker.token.cancel();
            debug!("alarm poller cancelled");
        }
    }

    /// cancels the poller and waits for it to finish its current tick
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.token.cancel();
            if worker.handle.join().is_err() {
                error!("alarm poller panicked");
            }
        }
    }
}

impl<F: Fire> Drop for Scheduler<F> {
    fn drop(&mut self) {
        self.pause();
    }
}

fn poll<F: Fire + ?Sized>(
    state: &SharedState,
    alerter: &F,
    token: &CancelToken,
    interval: Duration,
    now: fn() -> chrono::NaiveDateTime,
) {
    while !token.is_cancelled() {
        let (tick, sound) = {
            let mut state = state.lock();
            (state.tick(now()), state.sound_path.clone())
        };
        match tick {
            Tick::Wait => {}
            Tick::Fire => {
                info!("alarm fired");
                alerter.fire(&sound);
            }
            Tick::FireAndStop => {
                info!("one shot alarm fired, stopping poller");
                alerter.fire(&sound);
                token.cancel();
                break;
            }
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{AlarmState, Repeat};
    use chrono::{Duration as TimeDelta, NaiveDate, NaiveDateTime};
    use std::{
        path::PathBuf,
        sync::Mutex,
        time::Instant,
    };

    #[derive(Default)]
    struct Recorder(Mutex<Vec<PathBuf>>);

    impl Fire for Recorder {
        fn fire(&self, sound: &Path) {
            self.0.lock().unwrap().push(sound.to_path_buf());
        }
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.0.lock().unwrap().len()
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn scheduler(state: &SharedState) -> Scheduler<Recorder> {
        Scheduler::new(state.clone(), Arc::new(Recorder::default()))
            .with_interval(Duration::from_millis(5))
            .with_clock(noon)
    }

    fn wait_for(mut done: impl FnMut() -> bool) {
        let start = Instant::now();
        while !done() {
            assert!(start.elapsed() < Duration::from_secs(5), "timed out");
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn one_shot_fires_once_and_stops_polling() {
        let state = SharedState::new(AlarmState::new(PathBuf::from("chime.wav")));
        {
            let mut alarm = state.lock();
            alarm.next_fire = Some(noon() - TimeDelta::minutes(1));
            alarm.repeat = Repeat::Once;
        }
        let mut scheduler = scheduler(&state);
        scheduler.ensure_running();
        wait_for(|| !scheduler.is_running());
        assert_eq!(scheduler.alerter().count(), 1);
        assert_eq!(
            scheduler.alerter().0.lock().unwrap()[0],
            PathBuf::from("chime.wav")
        );
        assert_eq!(state.lock().next_fire, None);
        scheduler.shutdown();
    }

    #[test]
    fn daily_keeps_polling_until_paused() {
        let state = SharedState::new(AlarmState::new(PathBuf::from("chime.wav")));
        let due = noon() - TimeDelta::seconds(1);
        {
            let mut alarm = state.lock();
            alarm.next_fire = Some(due);
            alarm.repeat = Repeat::Daily;
        }
        let mut scheduler = scheduler(&state);
        scheduler.ensure_running();
        wait_for(|| scheduler.alerter().count() == 1);
        assert_eq!(state.lock().next_fire, Some(due + TimeDelta::days(1)));
        thread::sleep(Duration::from_millis(30));
        assert!(scheduler.is_running());
        assert_eq!(scheduler.alerter().count(), 1);

        scheduler.pause();
        assert!(!scheduler.is_running());
        scheduler.shutdown();
    }

    #[test]
    fn snooze_fires_through_the_poller() {
        let state = SharedState::new(AlarmState::new(PathBuf::from("chime.wav")));
        state.lock().snooze_until = Some(noon());
        let mut scheduler = scheduler(&state);
        scheduler.ensure_running();
        wait_for(|| scheduler.alerter().count() == 1);
        assert_eq!(state.lock().snooze_until, None);
        // nothing else is pending, the poller idles
        thread::sleep(Duration::from_millis(20));
        assert!(scheduler.is_running());
        scheduler.shutdown();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn ensure_running_does_not_double_spawn() {
        let state = SharedState::new(AlarmState::new(PathBuf::from("chime.wav")));
        let mut scheduler = scheduler(&state);
        scheduler.ensure_running();
        scheduler.ensure_running();
        state.lock().snooze_until = Some(noon());
        wait_for(|| scheduler.alerter().count() >= 1);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(scheduler.alerter().count(), 1);
        scheduler.shutdown();
    }

    #[test]
    fn restart_after_pause() {
        let state = SharedState::new(AlarmState::new(PathBuf::from("chime.wav")));
        let mut scheduler = scheduler(&state);
        scheduler.ensure_running();
        scheduler.pause();
        assert!(!scheduler.is_running());
        scheduler.ensure_running();
        assert!(scheduler.is_running());
        state.lock().snooze_until = Some(noon());
        wait_for(|| scheduler.alerter().count() == 1);
        scheduler.shutdown();
    }
}
