//! # Realtime-Channel Protocol
//!
//! Every message on the realtime channel is an envelope of the form
//! `{ "command": <string>, "payload": <object> }`. This module defines the
//! known command kinds, the envelope itself, and a strongly-typed payload
//! struct per command kind.
//!
//! # Parse policy
//!
//! Inbound text goes through [`Envelope::parse`], which distinguishes three
//! outcomes the dispatcher treats differently:
//!
//! - malformed JSON or a missing/ill-typed `command` field → `Err` (logged
//!   and dropped by the dispatcher);
//! - a well-formed envelope whose command kind we do not know → `Ok(None)`
//!   (silently ignored);
//! - a known kind → `Ok(Some(envelope))`, routed to exactly one handler.
//!
//! Payloads stay as raw JSON inside the envelope; each handler decodes its
//! own kind into the matching typed struct via [`Envelope::decode`], so a
//! shape mismatch fails explicitly and locally instead of propagating an
//! untyped map through the state machine.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::movement::GeoPoint;

/// The command kinds this engine sends or consumes.
///
/// The backend speaks a wider vocabulary; anything outside this set is
/// ignored on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    RequestEstimate,
    ConfirmTrip,
    DriverLocation,
    AcceptTrip,
    RejectTrip,
    ArrivedForPickup,
    StartTrip,
    CompleteTrip,
    RateDriver,
    RateCustomer,
    NewTripOffer,
    Eta,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::RequestEstimate => "requestEstimate",
            Command::ConfirmTrip => "confirmTrip",
            Command::DriverLocation => "driverLocation",
            Command::AcceptTrip => "acceptTrip",
            Command::RejectTrip => "rejectTrip",
            Command::ArrivedForPickup => "arrivedForPickup",
            Command::StartTrip => "startTrip",
            Command::CompleteTrip => "completeTrip",
            Command::RateDriver => "rateDriver",
            Command::RateCustomer => "rateCustomer",
            Command::NewTripOffer => "newTripOffer",
            Command::Eta => "eta",
        }
    }

    /// Maps a wire string onto a known kind, or `None` for kinds this
    /// engine does not consume.
    fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "requestEstimate" => Command::RequestEstimate,
            "confirmTrip" => Command::ConfirmTrip,
            "driverLocation" => Command::DriverLocation,
            "acceptTrip" => Command::AcceptTrip,
            "rejectTrip" => Command::RejectTrip,
            "arrivedForPickup" => Command::ArrivedForPickup,
            "startTrip" => Command::StartTrip,
            "completeTrip" => Command::CompleteTrip,
            "rateDriver" => Command::RateDriver,
            "rateCustomer" => Command::RateCustomer,
            "newTripOffer" => Command::NewTripOffer,
            "eta" => Command::Eta,
            _ => return None,
        })
    }
}

/// One realtime-channel message: a command kind plus its raw payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub command: Command,
    pub payload: serde_json::Value,
}

impl Envelope {
    /// Builds an outbound envelope from a typed payload.
    pub fn new<T: Serialize>(command: Command, payload: &T) -> Result<Self, SimError> {
        Ok(Self {
            command,
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Parses inbound channel text. See the module docs for the policy on
    /// malformed input versus unknown command kinds.
    pub fn parse(text: &str) -> Result<Option<Self>, SimError> {
        #[derive(Deserialize)]
        struct Raw {
            command: String,
            #[serde(default)]
            payload: serde_json::Value,
        }

        let raw: Raw = serde_json::from_str(text)?;
        Ok(Command::from_wire(&raw.command).map(|command| Self {
            command,
            payload: raw.payload,
        }))
    }

    /// Decodes the payload into the typed struct for this command kind.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, SimError> {
        Ok(serde_json::from_value(self.payload.clone())?)
    }

    pub fn to_text(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A coordinate pair as the backend spells it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<GeoPoint> for LatLng {
    fn from(p: GeoPoint) -> Self {
        Self {
            latitude: p.lat,
            longitude: p.lng,
        }
    }
}

impl From<LatLng> for GeoPoint {
    fn from(l: LatLng) -> Self {
        GeoPoint::new(l.latitude, l.longitude)
    }
}

/// GeoJSON-style point wrapper used inside location updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLocation {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: LatLng,
}

impl RawLocation {
    pub fn point(p: GeoPoint) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: p.into(),
        }
    }
}

/// Payload of an outbound `driverLocation` update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocationPayload {
    pub raw_location: RawLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_category_id: Option<u32>,
}

/// Payload of `requestEstimate` and `confirmTrip` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequestPayload {
    pub origin: LatLng,
    pub destination: LatLng,
    #[serde(rename = "category_id", skip_serializing_if = "Option::is_none")]
    pub vehicle_category_id: Option<u32>,
}

/// Payload of the trip-progress commands (`acceptTrip`, `rejectTrip`,
/// `arrivedForPickup`, `startTrip`, `completeTrip`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripActionPayload {
    pub trip_id: String,
}

/// Payload of `rateDriver` / `rateCustomer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRatingPayload {
    pub trip_id: String,
    pub rating: f64,
}

/// Payload of an inbound `newTripOffer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripOfferPayload {
    pub trip_offer: TripOffer,
    pub pickup_estimate: RouteEstimate,
    pub trip_estimate: RouteEstimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripOffer {
    pub trip_id: String,
    pub trip: TripRoute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRoute {
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub destination_lat: f64,
    pub destination_lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub route: Route,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub polyline: EncodedPolyline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedPolyline {
    #[serde(rename = "encodedPolyline")]
    pub encoded: String,
}

/// Payload of the inbound `confirmTrip` acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmTripAck {
    pub id: String,
}
