//! Reverse geocoding with the Google Geocoding API.

use crate::error::transport_error;
use async_trait::async_trait;
use reqwest::Client;
use sentinel_core::collaborators::{Coordinates, GeocodedAddress, Geocoder};
use sentinel_core::{CollaboratorError, CollaboratorResult};
use serde::Deserialize;

/// Component types that name a barangay, in order of preference.
const BARANGAY_TYPES: &[&str] = &[
    "sublocality_level_1",
    "sublocality",
    "neighborhood",
    "administrative_area_level_3",
];
const REGION_TYPES: &[&str] = &["administrative_area_level_1"];
const MUNICIPALITY_TYPES: &[&str] = &["locality", "administrative_area_level_2"];

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

fn first_component(components: &[AddressComponent], wanted: &[&str]) -> String {
    wanted
        .iter()
        .find_map(|ty| {
            components
                .iter()
                .find(|c| c.types.iter().any(|t| t == ty))
                .map(|c| c.long_name.clone())
        })
        .unwrap_or_default()
}

/// Turns a geocoding response into an address. A status other than `OK` becomes the error code.
pub fn address_from_response(response: GeocodeResponse) -> CollaboratorResult<GeocodedAddress> {
    if response.status != "OK" {
        let detail = response
            .error_message
            .unwrap_or_else(|| "Failed to get location".to_string());
        return Err(CollaboratorError::with_code(response.status, detail));
    }

    let Some(first) = response.results.into_iter().next() else {
        return Ok(GeocodedAddress::default());
    };
    let components = &first.address_components;
    Ok(GeocodedAddress {
        barangay: first_component(components, BARANGAY_TYPES),
        region: first_component(components, REGION_TYPES),
        municipality: first_component(components, MUNICIPALITY_TYPES),
        formatted_address: first.formatted_address,
    })
}

pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn reverse_geocode(&self, at: Coordinates) -> CollaboratorResult<GeocodedAddress> {
        let url = format!("{}/maps/api/geocode/json", self.base_url);
        let latlng = format!("{},{}", at.latitude, at.longitude);
        let response = self
            .client
            .get(&url)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().as_u16() == 503 {
            return Err(CollaboratorError::with_code("unavailable", "Geocoding service unavailable"));
        }
        let body: GeocodeResponse = response.json().await.map_err(transport_error)?;
        address_from_response(body)
    }
}
