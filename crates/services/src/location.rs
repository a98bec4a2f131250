use async_trait::async_trait;
use sentinel_core::collaborators::{Coordinates, LocationSensor};
use sentinel_core::{CollaboratorError, CollaboratorResult};

/// Location sensor for hosts without GPS: reports coordinates supplied up front.
///
/// With no coordinates it behaves like a device whose location permission was denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation {
    coordinates: Option<Coordinates>,
}

impl FixedLocation {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(Some(Coordinates {
            latitude,
            longitude,
        }))
    }
}

#[async_trait]
impl LocationSensor for FixedLocation {
    async fn current_position(&self) -> CollaboratorResult<Coordinates> {
        self.coordinates.ok_or_else(|| {
            CollaboratorError::with_code("permission-denied", "Location permission denied")
        })
    }
}
