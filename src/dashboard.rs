//! Aggregation service owning the tracked cities and their latest results
//!
//! Every mutation is a single commit on a `watch` channel, so subscribers
//! only ever observe settled snapshots. Overlapping refresh cycles are
//! allowed; each commits independently and the last commit wins.

use crate::api::WeatherSource;
use crate::models::{CurrentConditions, ForecastSeries, TemperatureUnit, TrackedCityList};
use crate::pipeline::{self, AggregationResult};
use crate::storage::CityStore;
use crate::weather::search_cities;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Message shown when a whole refresh cycle faults
pub const BATCH_FAILURE_MESSAGE: &str = "Failed to fetch weather data";

/// Shortest accepted auto-refresh period
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPhase {
    /// No refresh has run yet
    #[default]
    Idle,
    /// At least one refresh cycle is in flight
    Fetching,
    /// The last cycle committed its results
    Settled,
    /// The last cycle faulted as a whole; prior results were kept
    BatchFailed,
}

/// How a single refresh cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Settled { failed_fetches: usize },
    BatchFailed,
}

/// Everything the view layer renders, as of the last commit
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub cities: TrackedCityList,
    /// `None` marks a failed fetch; a missing key means not fetched yet
    pub current: HashMap<String, Option<CurrentConditions>>,
    pub forecasts: HashMap<String, Option<ForecastSeries>>,
    pub error: Option<String>,
    pub phase: RefreshPhase,
    pub in_flight: usize,
    pub unit: TemperatureUnit,
    pub auto_refresh: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
    #[must_use]
    pub fn current_for(&self, city: &str) -> Option<&CurrentConditions> {
        self.current.get(city).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn forecast_for(&self, city: &str) -> Option<&ForecastSeries> {
        self.forecasts.get(city).and_then(Option::as_ref)
    }

    fn purge(&mut self, city: &str) {
        self.current.remove(city);
        self.forecasts.remove(city);
    }

    /// Merge one cycle's results, dropping cities untracked since it began
    fn commit(&mut self, result: AggregationResult) {
        let cities = &self.cities;
        self.current
            .extend(result.current.into_iter().filter(|(c, _)| cities.contains(c)));
        self.forecasts
            .extend(result.forecasts.into_iter().filter(|(c, _)| cities.contains(c)));
        self.current.retain(|c, _| cities.contains(c));
        self.forecasts.retain(|c, _| cities.contains(c));
    }

    fn finish_cycle(&mut self, phase: RefreshPhase) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.phase = phase;
        }
    }
}

pub struct Dashboard {
    source: Arc<dyn WeatherSource>,
    store: Arc<dyn CityStore>,
    state: watch::Sender<DashboardSnapshot>,
    timer: Mutex<Option<JoinHandle<()>>>,
    refresh_interval: Duration,
}

impl Dashboard {
    /// Build a dashboard, restoring the tracked cities from `store`.
    ///
    /// An unreadable store is logged and treated as an empty list. No
    /// refresh is started. Periods below [`MIN_REFRESH_INTERVAL`] are raised
    /// to it.
    pub async fn restore(
        source: Arc<dyn WeatherSource>,
        store: Arc<dyn CityStore>,
        refresh_interval: Duration,
    ) -> Arc<Self> {
        let cities: TrackedCityList = match store.load().await {
            Ok(cities) => cities.into_iter().collect(),
            Err(e) => {
                warn!("Could not restore tracked cities, starting empty: {:#}", e);
                TrackedCityList::new()
            }
        };
        info!("Restored {} tracked cities", cities.len());

        if refresh_interval < MIN_REFRESH_INTERVAL {
            warn!(
                "Refresh interval {:?} too short, using {:?}",
                refresh_interval, MIN_REFRESH_INTERVAL
            );
        }
        let refresh_interval = refresh_interval.max(MIN_REFRESH_INTERVAL);

        let (state, _) = watch::channel(DashboardSnapshot {
            cities,
            ..DashboardSnapshot::default()
        });

        Arc::new(Self {
            source,
            store,
            state,
            timer: Mutex::new(None),
            refresh_interval,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn cities(&self) -> TrackedCityList {
        self.state.borrow().cities.clone()
    }

    /// Track a new city, persist the list and refresh.
    ///
    /// Returns `false` without side effects for blank or duplicate names. A
    /// running auto-refresh timer restarts its period from this refresh.
    pub async fn add_city(self: &Arc<Self>, city: &str) -> bool {
        let city = city.trim();
        let added = self.state.send_if_modified(|s| {
            let added = s.cities.add(city);
            if added {
                s.error = None;
            }
            added
        });
        if !added {
            debug!("Ignoring add of '{}'", city);
            return false;
        }

        info!("Tracking {}", city);
        self.persist().await;
        self.refresh().await;
        self.rearm_auto_refresh();
        true
    }

    /// Stop tracking a city, purge its results, persist the list and refresh.
    pub async fn remove_city(self: &Arc<Self>, city: &str) -> bool {
        let city = city.trim();
        let removed = self.state.send_if_modified(|s| {
            let removed = s.cities.remove(city);
            if removed {
                s.purge(city);
            }
            removed
        });
        if !removed {
            debug!("Ignoring removal of untracked '{}'", city);
            return false;
        }

        info!("No longer tracking {}", city);
        self.persist().await;
        self.refresh().await;
        self.rearm_auto_refresh();
        true
    }

    async fn persist(&self) {
        let cities = self.state.borrow().cities.as_slice().to_vec();
        if let Err(e) = self.store.save(&cities).await {
            warn!("Failed to persist tracked cities: {:#}", e);
        }
    }

    /// Run one refresh cycle over the currently tracked cities
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut cities = Vec::new();
        self.state.send_modify(|s| {
            s.in_flight += 1;
            s.phase = RefreshPhase::Fetching;
            cities = s.cities.as_slice().to_vec();
        });

        let fan_out = AssertUnwindSafe(pipeline::aggregate(self.source.as_ref(), &cities))
            .catch_unwind()
            .await;

        match fan_out {
            Ok(result) => {
                let failed_fetches = result.failures.len();
                let last_error = result.last_error();
                self.state.send_modify(|s| {
                    s.commit(result);
                    if last_error.is_some() {
                        s.error = last_error;
                    }
                    s.last_refreshed = Some(Utc::now());
                    s.finish_cycle(RefreshPhase::Settled);
                });
                RefreshOutcome::Settled { failed_fetches }
            }
            Err(_) => {
                error!("Refresh of {} cities faulted", cities.len());
                self.state.send_modify(|s| {
                    s.error = Some(BATCH_FAILURE_MESSAGE.to_string());
                    s.finish_cycle(RefreshPhase::BatchFailed);
                });
                RefreshOutcome::BatchFailed
            }
        }
    }

    /// City-name suggestions for a partial query
    pub async fn search(&self, query: &str) -> Vec<String> {
        search_cities(self.source.as_ref(), query).await
    }

    /// Start the periodic refresh timer. Returns `false` if it already runs.
    ///
    /// The timer task holds only a weak reference; it ends once the
    /// dashboard is dropped. Ticks are skipped while no city is tracked.
    pub fn start_auto_refresh(self: &Arc<Self>) -> bool {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        *timer = Some(self.spawn_timer());
        drop(timer);

        self.state.send_modify(|s| s.auto_refresh = true);
        info!("Auto-refresh every {}s", self.refresh_interval.as_secs());
        true
    }

    /// Restart a running timer so its next tick is a full period away
    fn rearm_auto_refresh(self: &Arc<Self>) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take_if(|handle| !handle.is_finished()) {
            handle.abort();
            *timer = Some(self.spawn_timer());
            debug!("Auto-refresh period restarted after list change");
        }
    }

    fn spawn_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let dashboard = Arc::downgrade(self);
        let period = self.refresh_interval;
        tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(dashboard) = dashboard.upgrade() else {
                    break;
                };
                let idle = dashboard.state.borrow().cities.is_empty();
                if idle {
                    debug!("Auto-refresh tick skipped, no cities tracked");
                    continue;
                }
                dashboard.refresh().await;
            }
        })
    }

    /// Cancel the refresh timer. Returns whether one was running.
    pub fn stop_auto_refresh(&self) -> bool {
        let handle = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let was_running = match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        };

        self.state.send_modify(|s| s.auto_refresh = false);
        if was_running {
            info!("Auto-refresh stopped");
        }
        was_running
    }

    pub fn set_auto_refresh(self: &Arc<Self>, enabled: bool) {
        if enabled {
            self.start_auto_refresh();
        } else {
            self.stop_auto_refresh();
        }
    }

    pub fn set_unit(&self, unit: TemperatureUnit) {
        self.state.send_if_modified(|s| {
            let changed = s.unit != unit;
            s.unit = unit;
            changed
        });
    }

    /// Switch between Celsius and Fahrenheit, returning the new unit
    pub fn toggle_unit(&self) -> TemperatureUnit {
        let mut unit = TemperatureUnit::default();
        self.state.send_modify(|s| {
            s.unit = s.unit.toggled();
            unit = s.unit;
        });
        unit
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        let timer = self.timer.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}
