use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wayside::{
    geocoder::{Location, PlaceSuggestion},
    oba::RouteWithAgency,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesDto {
    pub routes: Arc<[RouteWithAgency]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDto {
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsDto {
    pub suggestions: Vec<PlaceSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

impl ErrorDto {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
