pub mod alerts;
pub mod analytics;
pub mod config;
pub mod geocoder;
pub mod map;
pub mod oba;
pub mod shared;
pub mod surveys;
pub mod user;
pub mod vehicles;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::map::{
        GoogleMapProvider, MapProvider, MarkerLayer, OpenStreetMapProvider, PolylineLayer,
        VehicleLayer, Viewport,
    };
    pub use crate::oba::{ObaClient, RoutesCache};
    pub use crate::shared::{BoundingBox, Coordinate, Distance};
    pub use crate::surveys::{SurveyClient, SurveyEngine, SurveyStorage};
    pub use crate::vehicles::{VehiclePoller, VehicleSource, VehicleTracker};
}
