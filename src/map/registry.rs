use std::collections::HashMap;

use tracing::debug;

use super::{
    MarkerId, PinMarker, Polyline, PolylineId, Popup, StopMarker, Theme, VehicleMarker, ViewState,
};
use crate::{
    oba::{Stop, Trip, TripStatus},
    shared::geo::Coordinate,
    vehicles::VehiclePopup,
};

/// Bookkeeping shared by both providers. Markers are indexed by stop id and
/// by handle, and every popup lives and dies with its marker. Vehicle popups
/// name their next stop only while that stop has a marker.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    next_id: u64,
    pub view: Option<ViewState>,
    pub theme: Theme,
    pub stop_markers: HashMap<String, StopMarker>,
    pub vehicles: HashMap<MarkerId, VehicleMarker>,
    pub pins: HashMap<MarkerId, PinMarker>,
    pub user_location: Option<PinMarker>,
    pub polylines: HashMap<PolylineId, Polyline>,
    pub popups: HashMap<MarkerId, Popup>,
    pub open_popup: Option<MarkerId>,
}

impl Registry {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn marker_id(&mut self) -> MarkerId {
        MarkerId(self.next_id())
    }

    pub fn polyline_id(&mut self) -> PolylineId {
        PolylineId(self.next_id())
    }

    pub fn is_ready(&self) -> bool {
        self.view.is_some()
    }

    pub fn insert_stop(&mut self, stop: &Stop, arrival_time: Option<i64>) -> Option<MarkerId> {
        if !self.is_ready() {
            return None;
        }
        self.remove_stop(&stop.id);
        let id = self.marker_id();
        self.popups.insert(
            id,
            Popup::Stop {
                stop_name: stop.name.clone(),
                arrival_time,
            },
        );
        self.stop_markers.insert(
            stop.id.clone(),
            StopMarker {
                id,
                stop: stop.clone(),
                arrival_time,
                highlighted: false,
            },
        );
        Some(id)
    }

    pub fn set_highlight(&mut self, stop_id: &str, highlighted: bool) -> bool {
        match self.stop_markers.get_mut(stop_id) {
            Some(marker) => {
                marker.highlighted = highlighted;
                true
            }
            None => false,
        }
    }

    pub fn remove_stop(&mut self, stop_id: &str) -> bool {
        match self.stop_markers.remove(stop_id) {
            Some(marker) => {
                self.release(marker.id);
                true
            }
            None => false,
        }
    }

    pub fn clear_stops(&mut self) {
        let ids: Vec<MarkerId> = self.stop_markers.drain().map(|(_, m)| m.id).collect();
        ids.into_iter().for_each(|id| self.release(id));
    }

    pub fn vehicle_popup(&self, status: &TripStatus, trip: &Trip) -> VehiclePopup {
        let next_stop_name = status
            .next_stop
            .as_ref()
            .and_then(|id| self.stop_markers.get(id))
            .map(|marker| marker.stop.name.clone());
        VehiclePopup::new(status, trip, next_stop_name)
    }

    /// Vehicles without a position are not drawn.
    pub fn insert_vehicle(
        &mut self,
        status: &TripStatus,
        trip: &Trip,
        icon_svg: String,
        z_index: i32,
    ) -> Option<MarkerId> {
        if !self.is_ready() {
            return None;
        }
        let position = status.position.or(status.last_known_location)?;
        let id = self.marker_id();
        let popup = self.vehicle_popup(status, trip);
        self.popups.insert(id, Popup::Vehicle(popup.clone()));
        self.vehicles.insert(
            id,
            VehicleMarker {
                id,
                trip_id: trip.id.clone(),
                position: position.into(),
                icon_svg,
                popup,
                z_index,
            },
        );
        Some(id)
    }

    pub fn update_vehicle(
        &mut self,
        id: MarkerId,
        status: &TripStatus,
        trip: &Trip,
        icon_svg: String,
        popup: VehiclePopup,
    ) -> bool {
        let Some(marker) = self.vehicles.get_mut(&id) else {
            return false;
        };
        if let Some(position) = status.position.or(status.last_known_location) {
            marker.position = position.into();
        }
        marker.trip_id = trip.id.clone();
        marker.icon_svg = icon_svg;
        marker.popup = popup.clone();
        if let Some(Popup::Vehicle(open)) = self.popups.get_mut(&id) {
            *open = popup;
        }
        true
    }

    pub fn remove_vehicle(&mut self, id: MarkerId) -> bool {
        match self.vehicles.remove(&id) {
            Some(_) => {
                self.release(id);
                true
            }
            None => false,
        }
    }

    pub fn clear_vehicles(&mut self) {
        let ids: Vec<MarkerId> = self.vehicles.drain().map(|(id, _)| id).collect();
        ids.into_iter().for_each(|id| self.release(id));
    }

    pub fn insert_pin(&mut self, position: Coordinate, text: &str) -> Option<MarkerId> {
        if !self.is_ready() {
            return None;
        }
        let id = self.marker_id();
        self.popups.insert(
            id,
            Popup::Pin {
                text: text.to_string(),
            },
        );
        self.pins.insert(
            id,
            PinMarker {
                id,
                position,
                text: text.to_string(),
            },
        );
        Some(id)
    }

    pub fn remove_pin(&mut self, id: MarkerId) -> bool {
        match self.pins.remove(&id) {
            Some(_) => {
                self.release(id);
                true
            }
            None => false,
        }
    }

    pub fn set_user_location(&mut self, position: Coordinate) -> Option<MarkerId> {
        if !self.is_ready() {
            return None;
        }
        let id = self.marker_id();
        self.user_location = Some(PinMarker {
            id,
            position,
            text: "Your Location".into(),
        });
        Some(id)
    }

    pub fn open(&mut self, id: MarkerId) -> Option<&Popup> {
        if !self.popups.contains_key(&id) {
            return None;
        }
        self.open_popup = Some(id);
        self.popups.get(&id)
    }

    pub fn close_popup(&mut self) {
        self.open_popup = None;
    }

    /// Drops the popup bound to a removed marker.
    fn release(&mut self, id: MarkerId) {
        if self.popups.remove(&id).is_some() {
            debug!("Released popup for {id}");
        }
        if self.open_popup == Some(id) {
            self.open_popup = None;
        }
    }
}
