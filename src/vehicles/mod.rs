//! Live vehicle markers for one route.
//!
//! [`VehicleTracker`] diffs every polled snapshot against the markers it
//! already placed, and [`VehiclePoller`] drives it on a fixed period.

mod icon;

pub use icon::*;

use std::{
    collections::{HashMap, HashSet},
    future::Future,
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::{Mutex, Notify},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, warn};

use crate::{
    map::VehicleLayer,
    oba::{Envelope, ObaClient, Trip, TripsForRoute, TripsForRouteParams},
    shared::build_url,
};

pub const POLL_INTERVAL: Duration = Duration::from_secs(30);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can report the current trip statuses of a route.
/// Failures are reported as an empty snapshot.
pub trait VehicleSource {
    fn fetch_vehicles(&self, route_id: &str) -> impl Future<Output = TripsForRoute> + Send;
}

/// Reads snapshots through the server's own trips-for-route proxy.
#[derive(Debug, Clone)]
pub struct HttpVehicleSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpVehicleSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!("Failed to build vehicle client, using defaults: {err}");
                reqwest::Client::new()
            });
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn try_fetch(&self, route_id: &str) -> Result<TripsForRoute, reqwest::Error> {
        let path = format!("api/oba/trips-for-route/{route_id}");
        let url = build_url(&self.base_url, &path, &[] as &[(&str, &str)]);
        let envelope: Envelope<TripsForRoute> = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope.data.unwrap_or_default())
    }
}

impl VehicleSource for HttpVehicleSource {
    async fn fetch_vehicles(&self, route_id: &str) -> TripsForRoute {
        self.try_fetch(route_id).await.unwrap_or_else(|err| {
            warn!("Failed to fetch vehicles for {route_id}: {err}");
            TripsForRoute::default()
        })
    }
}

impl VehicleSource for ObaClient {
    async fn fetch_vehicles(&self, route_id: &str) -> TripsForRoute {
        self.trips_for_route(route_id, TripsForRouteParams::default())
            .await
            .unwrap_or_else(|err| {
                warn!("Failed to fetch vehicles for {route_id}: {err}");
                TripsForRoute::default()
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Trip cache and marker map for a single map. `M` is the provider's vehicle
/// marker handle.
#[derive(Debug)]
pub struct VehicleTracker<M> {
    /// Trip definitions by trip id. The first definition seen is kept.
    trips: HashMap<String, Trip>,
    /// Markers by active trip id.
    markers: HashMap<String, M>,
}

impl<M> Default for VehicleTracker<M> {
    fn default() -> Self {
        Self {
            trips: HashMap::new(),
            markers: HashMap::new(),
        }
    }
}

impl<M> VehicleTracker<M> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn trip(&self, trip_id: &str) -> Option<&Trip> {
        self.trips.get(trip_id)
    }

    pub fn marker(&self, trip_id: &str) -> Option<&M> {
        self.markers.get(trip_id)
    }

    pub fn active_trip_ids(&self) -> impl Iterator<Item = &str> {
        self.markers.keys().map(String::as_str)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Forgets every trip and marker without touching the map.
    pub fn clear(&mut self) {
        self.trips.clear();
        self.markers.clear();
    }

    /// Removes every tracked marker from the map, then forgets them.
    pub fn clear_markers<P>(&mut self, provider: &mut P)
    where
        P: VehicleLayer<VehicleMarker = M>,
    {
        for (_, marker) in self.markers.drain() {
            provider.remove_vehicle_marker(marker);
        }
        self.trips.clear();
    }

    /// Applies one snapshot to the map.
    pub fn reconcile<P>(
        &mut self,
        route_id: &str,
        snapshot: &TripsForRoute,
        provider: &mut P,
    ) -> ReconcileSummary
    where
        P: VehicleLayer<VehicleMarker = M>,
    {
        for trip in &snapshot.references.trips {
            self.trips
                .entry(trip.id.clone())
                .or_insert_with(|| trip.clone());
        }

        let mut summary = ReconcileSummary::default();
        let mut active: HashSet<&str> = HashSet::new();
        for details in &snapshot.list {
            let Some(status) = details.status.as_ref() else {
                continue;
            };
            let Some(trip_id) = status.active_trip_id.as_deref() else {
                continue;
            };
            let Some(trip) = self.trips.get(trip_id) else {
                debug!("Skipping unknown trip {trip_id}");
                continue;
            };
            if trip.route_id != route_id || status.is_canceled() {
                continue;
            }
            if !active.insert(trip_id) {
                continue;
            }

            match self.markers.get(trip_id) {
                Some(marker) => {
                    provider.update_vehicle_marker(marker, status, trip);
                    summary.updated += 1;
                }
                None => {
                    if let Some(marker) = provider.add_vehicle_marker(status, trip) {
                        self.markers.insert(trip_id.to_string(), marker);
                        summary.added += 1;
                    }
                }
            }
        }

        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|trip_id| !active.contains(trip_id.as_str()))
            .cloned()
            .collect();
        for trip_id in stale {
            if let Some(marker) = self.markers.remove(&trip_id) {
                provider.remove_vehicle_marker(marker);
                summary.removed += 1;
            }
        }
        summary
    }

    /// Fetches a snapshot for `route_id` and applies it.
    pub async fn update_vehicle_markers<S, P>(
        &mut self,
        route_id: &str,
        source: &S,
        provider: &mut P,
    ) -> ReconcileSummary
    where
        S: VehicleSource,
        P: VehicleLayer<VehicleMarker = M>,
    {
        let snapshot = source.fetch_vehicles(route_id).await;
        let summary = self.reconcile(route_id, &snapshot, provider);
        debug!(
            "Route {route_id}: {} added, {} updated, {} removed",
            summary.added, summary.updated, summary.removed
        );
        summary
    }
}

/// Keeps a tracker in sync with a route on a fixed period.
pub struct VehiclePoller;

impl VehiclePoller {
    /// Polls once right away, then every `period` until the handle is
    /// cancelled or dropped. A poll that finds the tracker still busy with
    /// the previous one is skipped. A fetch that outlives `period` counts as
    /// an empty snapshot.
    pub fn spawn<S, P>(
        route_id: impl Into<String>,
        tracker: Arc<Mutex<VehicleTracker<P::VehicleMarker>>>,
        source: Arc<S>,
        provider: Arc<Mutex<P>>,
        period: Duration,
    ) -> PollHandle
    where
        S: VehicleSource + Send + Sync + 'static,
        P: VehicleLayer + Send + 'static,
        P::VehicleMarker: Send + 'static,
    {
        let route_id = route_id.into();
        let trigger = Arc::new(Notify::new());
        let wake = trigger.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = wake.notified() => {}
                }
                let Ok(mut tracker) = tracker.try_lock() else {
                    debug!("Previous poll for {route_id} still in flight, skipping");
                    continue;
                };
                let snapshot =
                    match tokio::time::timeout(period, source.fetch_vehicles(&route_id)).await {
                        Ok(snapshot) => snapshot,
                        Err(_) => {
                            warn!("Fetching vehicles for {route_id} timed out");
                            TripsForRoute::default()
                        }
                    };
                let mut provider = provider.lock().await;
                tracker.reconcile(&route_id, &snapshot, &mut *provider);
            }
        });

        PollHandle { task, trigger }
    }
}

/// Handle to a running poll. Dropping it stops polling.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
    trigger: Arc<Notify>,
}

impl PollHandle {
    /// Requests an extra poll without waiting for the next tick.
    pub fn poll_now(&self) {
        self.trigger.notify_one();
    }

    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
