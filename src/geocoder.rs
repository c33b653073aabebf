//! Location search against Google or Bing, normalised to one shape.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const GOOGLE_PLACES_AUTOCOMPLETE_URL: &str =
    "https://places.googleapis.com/v1/places:autocomplete";
pub const BING_LOCATIONS_URL: &str = "https://dev.virtualearth.net/REST/v1/Locations";
pub const BING_AUTOSUGGEST_URL: &str = "https://dev.virtualearth.net/REST/v1/Autosuggest";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid geocoding provider")]
    InvalidProvider(String),
    #[error("Http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeocoderProvider {
    #[default]
    Google,
    Bing,
}

impl FromStr for GeocoderProvider {
    type Err = self::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "bing" => Ok(Self::Bing),
            _ => Err(self::Error::InvalidProvider(s.to_string())),
        }
    }
}

impl Display for GeocoderProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Bing => write!(f, "bing"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub formatted_address: String,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSuggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub name: String,
    pub display_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleGeocodeResponse {
    status: String,
    results: Vec<GoogleGeocodeResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleGeocodeResult {
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleAutocompleteResponse {
    suggestions: Vec<GoogleSuggestion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoogleSuggestion {
    place_prediction: Option<GooglePlacePrediction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GooglePlacePrediction {
    place_id: String,
    text: GoogleText,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleText {
    text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BingResponse {
    resource_sets: Vec<BingResourceSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BingResourceSet {
    estimated_total: u32,
    resources: Vec<BingResource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BingResource {
    name: String,
    point: Option<BingPoint>,
    address: BingAddress,
    value: Option<Vec<BingResource>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BingPoint {
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BingAddress {
    formatted_address: String,
}

/// First result of a Google geocode reply whose status is `OK`.
pub fn parse_google_geocode(body: &str) -> Option<Location> {
    let response: GoogleGeocodeResponse = serde_json::from_str(body).ok()?;
    if response.status != "OK" {
        return None;
    }
    let result = response.results.into_iter().next()?;
    Some(Location {
        name: result.formatted_address.clone(),
        formatted_address: result.formatted_address,
        geometry: result.geometry,
    })
}

pub fn parse_google_autocomplete(body: &str) -> Vec<PlaceSuggestion> {
    let response: GoogleAutocompleteResponse = serde_json::from_str(body).unwrap_or_default();
    response
        .suggestions
        .into_iter()
        .filter_map(|suggestion| suggestion.place_prediction)
        .map(|prediction| PlaceSuggestion {
            place_id: Some(prediction.place_id),
            name: prediction.text.text.clone(),
            display_text: prediction.text.text,
        })
        .collect()
}

fn bing_resources(body: &str) -> Vec<BingResource> {
    let response: BingResponse = serde_json::from_str(body).unwrap_or_default();
    match response.resource_sets.into_iter().next() {
        Some(set) if set.estimated_total > 0 => set.resources,
        _ => Vec::new(),
    }
}

/// First Bing location, `point.coordinates` being `[lat, lng]`.
pub fn parse_bing_geocode(body: &str) -> Option<Location> {
    let resource = bing_resources(body).into_iter().next()?;
    let coordinates = resource.point?.coordinates;
    let &[lat, lng] = coordinates.as_slice() else {
        return None;
    };
    Some(Location {
        name: resource.name,
        formatted_address: resource.address.formatted_address,
        geometry: Geometry {
            location: LatLng { lat, lng },
        },
    })
}

pub fn parse_bing_autosuggest(body: &str) -> Vec<PlaceSuggestion> {
    bing_resources(body)
        .into_iter()
        .flat_map(|resource| match resource.value {
            Some(values) => values
                .into_iter()
                .map(|value| PlaceSuggestion {
                    place_id: None,
                    display_text: format!("{} - {}", value.name, value.address.formatted_address),
                    name: value.name,
                })
                .collect::<Vec<_>>(),
            None => vec![PlaceSuggestion {
                place_id: None,
                name: resource.name,
                display_text: resource.address.formatted_address,
            }],
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Endpoints {
    pub google_geocode: String,
    pub google_places_autocomplete: String,
    pub bing_locations: String,
    pub bing_autosuggest: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            google_geocode: GOOGLE_GEOCODE_URL.into(),
            google_places_autocomplete: GOOGLE_PLACES_AUTOCOMPLETE_URL.into(),
            bing_locations: BING_LOCATIONS_URL.into(),
            bing_autosuggest: BING_AUTOSUGGEST_URL.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    provider: GeocoderProvider,
    api_key: String,
    endpoints: Endpoints,
}

impl Geocoder {
    pub fn new(provider: GeocoderProvider, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            provider,
            api_key: api_key.into(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn provider(&self) -> GeocoderProvider {
        self.provider
    }

    /// Geocodes with the configured provider.
    pub async fn geocode(&self, query: &str) -> Result<Option<Location>, self::Error> {
        match self.provider {
            GeocoderProvider::Google => self.google_geocode(query).await,
            GeocoderProvider::Bing => self.bing_geocode(query).await,
        }
    }

    /// Suggestions from the configured provider.
    pub async fn fetch_autocomplete_results(
        &self,
        query: &str,
    ) -> Result<Vec<PlaceSuggestion>, self::Error> {
        match self.provider {
            GeocoderProvider::Google => self.google_places_autocomplete(query).await,
            GeocoderProvider::Bing => self.bing_autosuggest_places(query).await,
        }
    }

    pub async fn google_geocode(&self, query: &str) -> Result<Option<Location>, self::Error> {
        let url = Url::parse_with_params(
            &self.endpoints.google_geocode,
            [("address", query), ("key", self.api_key.as_str())],
        )?;
        let body = self.http.get(url).send().await?.text().await?;
        let location = parse_google_geocode(&body);
        if location.is_none() {
            debug!("No google geocode result for {query}");
        }
        Ok(location)
    }

    pub async fn google_places_autocomplete(
        &self,
        input: &str,
    ) -> Result<Vec<PlaceSuggestion>, self::Error> {
        let body = self
            .http
            .post(&self.endpoints.google_places_autocomplete)
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&json!({ "input": input }))
            .send()
            .await?
            .text()
            .await?;
        Ok(parse_google_autocomplete(&body))
    }

    pub async fn bing_geocode(&self, query: &str) -> Result<Option<Location>, self::Error> {
        let url = Url::parse_with_params(
            &self.endpoints.bing_locations,
            [("query", query), ("key", self.api_key.as_str())],
        )?;
        let body = self.http.get(url).send().await?.text().await?;
        Ok(parse_bing_geocode(&body))
    }

    pub async fn bing_autosuggest_places(
        &self,
        query: &str,
    ) -> Result<Vec<PlaceSuggestion>, self::Error> {
        let url = Url::parse_with_params(
            &self.endpoints.bing_autosuggest,
            [("query", query), ("key", self.api_key.as_str())],
        )?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            warn!("Bing autosuggest responded with {}", response.status());
        }
        Ok(parse_bing_autosuggest(&response.text().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("google".parse::<GeocoderProvider>().unwrap(), GeocoderProvider::Google);
        assert_eq!(" Bing ".parse::<GeocoderProvider>().unwrap(), GeocoderProvider::Bing);
        let err = "invalid".parse::<GeocoderProvider>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid geocoding provider");
    }

    #[test]
    fn google_geocode_uses_address_as_name() {
        let body = r#"{"status":"OK","results":[{"geometry":{"location":{"lat":47.6205,"lng":-122.3493}},"formatted_address":"Space Needle, Seattle, WA"}]}"#;
        let location = parse_google_geocode(body).unwrap();
        assert_eq!(location.name, "Space Needle, Seattle, WA");
        assert_eq!(location.formatted_address, "Space Needle, Seattle, WA");
        assert_eq!(location.geometry.location, LatLng { lat: 47.6205, lng: -122.3493 });

        assert!(parse_google_geocode(r#"{"status":"ZERO_RESULTS","results":[]}"#).is_none());
        assert!(parse_google_geocode(r#"{"status":"OK","results":[]}"#).is_none());
    }

    #[test]
    fn google_autocomplete_suggestions() {
        assert!(parse_google_autocomplete("{}").is_empty());
        let body = r#"{"suggestions":[{"placePrediction":{"placeId":"123","text":{"text":"Space Needle, Seattle, WA"}}}]}"#;
        let suggestions = parse_google_autocomplete(body);
        assert_eq!(
            suggestions,
            vec![PlaceSuggestion {
                place_id: Some("123".into()),
                name: "Space Needle, Seattle, WA".into(),
                display_text: "Space Needle, Seattle, WA".into(),
            }]
        );
        let json = serde_json::to_value(&suggestions[0]).unwrap();
        assert_eq!(json["placeId"], "123");
        assert_eq!(json["displayText"], "Space Needle, Seattle, WA");
    }

    #[test]
    fn bing_geocode_reads_point_coordinates() {
        let body = r#"{"resourceSets":[{"estimatedTotal":1,"resources":[{"point":{"coordinates":[47.6205,-122.3493]},"address":{"formattedAddress":"Space Needle, Seattle, WA"},"name":"Space Needle"}]}]}"#;
        let location = parse_bing_geocode(body).unwrap();
        assert_eq!(location.name, "Space Needle");
        assert_eq!(location.geometry.location.lat, 47.6205);

        let empty = r#"{"resourceSets":[{"estimatedTotal":0,"resources":[]}]}"#;
        assert!(parse_bing_geocode(empty).is_none());
    }

    #[test]
    fn bing_autosuggest_shapes() {
        assert!(parse_bing_autosuggest(r#"{"resourceSets":[]}"#).is_empty());
        assert!(
            parse_bing_autosuggest(r#"{"resourceSets":[{"estimatedTotal":1,"resources":[]}]}"#)
                .is_empty()
        );

        let with_values = r#"{"resourceSets":[{"estimatedTotal":1,"resources":[{"value":[{"name":"Space Needle","address":{"formattedAddress":"Space Needle, Seattle, WA"}}]}]}]}"#;
        let suggestions = parse_bing_autosuggest(with_values);
        assert_eq!(suggestions[0].display_text, "Space Needle - Space Needle, Seattle, WA");
        assert_eq!(suggestions[0].place_id, None);

        let plain = r#"{"resourceSets":[{"estimatedTotal":1,"resources":[{"name":"Space Needle","address":{"formattedAddress":"Space Needle, Seattle, WA"}}]}]}"#;
        let suggestions = parse_bing_autosuggest(plain);
        assert_eq!(suggestions[0].name, "Space Needle");
        assert_eq!(suggestions[0].display_text, "Space Needle, Seattle, WA");
    }
}
