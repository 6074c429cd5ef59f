//! Domain DTOs for the marketplace API.
//!
//! # Design
//! Field names follow the server's camelCase JSON. Record ids are opaque
//! strings (`_id`) because the production server issues document ids, not
//! UUIDs. These types are defined independently from the mock-server crate;
//! integration tests catch schema drift.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Category of a crop listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropType {
    Vegetable,
    Fruit,
    Grain,
    Spice,
    Pulse,
    Oilseed,
    Fiber,
    Other,
}

impl CropType {
    pub const ALL: [CropType; 8] = [
        CropType::Vegetable,
        CropType::Fruit,
        CropType::Grain,
        CropType::Spice,
        CropType::Pulse,
        CropType::Oilseed,
        CropType::Fiber,
        CropType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CropType::Vegetable => "Vegetable",
            CropType::Fruit => "Fruit",
            CropType::Grain => "Grain",
            CropType::Spice => "Spice",
            CropType::Pulse => "Pulse",
            CropType::Oilseed => "Oilseed",
            CropType::Fiber => "Fiber",
            CropType::Other => "Other",
        }
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CropType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown crop type: {s}"))
    }
}

/// Unit a listing is priced and stocked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Kg,
    Ton,
    Piece,
    Liter,
    Bag,
}

/// Seller information embedded in every listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub owner_email: String,
    pub owner_name: String,
}

/// A crop-for-sale record as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: CropType,
    pub price_per_unit: f64,
    #[serde(default)]
    pub unit: Unit,
    pub quantity: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner.owner_email == email
    }
}

/// Create/update payload for a listing. `createdAt` is server-assigned and
/// never sent, so it cannot be changed after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingInput {
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: Option<CropType>,
    pub price_per_unit: f64,
    #[serde(default)]
    pub unit: Unit,
    pub quantity: f64,
    pub description: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
}

impl ListingInput {
    /// Prefills an edit form from an existing listing.
    pub fn from_listing(listing: &Listing) -> Self {
        Self {
            name: listing.name.clone(),
            crop_type: Some(listing.crop_type),
            price_per_unit: listing.price_per_unit,
            unit: listing.unit,
            quantity: listing.quantity,
            description: listing.description.clone(),
            location: listing.location.clone(),
            image: listing.image.clone(),
            owner: None,
        }
    }
}

/// Lifecycle of a buyer's interest in a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl InterestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InterestStatus::Pending => "pending",
            InterestStatus::Accepted => "accepted",
            InterestStatus::Rejected => "rejected",
        }
    }

    /// Only pending interests may be resolved, and only to a final state.
    pub fn can_transition_to(self, next: InterestStatus) -> bool {
        self == InterestStatus::Pending && next != InterestStatus::Pending
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing summary the server embeds in sent interests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub crop_type: CropType,
    pub location: String,
    pub unit: Unit,
    pub price_per_unit: f64,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
}

/// A buyer's expression of intent to purchase part of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    #[serde(rename = "_id")]
    pub id: String,
    pub crop_id: String,
    pub user_email: String,
    pub user_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: InterestStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_details: Option<CropSummary>,
}

/// Request payload for `POST /api/interests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterest {
    pub crop_id: String,
    pub user_email: String,
    pub user_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub message: String,
}

/// Request payload for `PUT /api/interests/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestStatusUpdate {
    pub interest_id: String,
    pub crop_id: String,
    pub status: InterestStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Farmer,
    Buyer,
}

/// A user's marketplace profile, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "photoURL", default)]
    pub photo_url: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub role: Role,
}

impl UserProfile {
    /// A fresh profile for a first sign-in, seeded from identity-provider data.
    pub fn bootstrap(email: &str, name: &str, photo_url: Option<&str>) -> Self {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            photo_url: photo_url.unwrap_or_default().to_string(),
            phone: String::new(),
            address: String::new(),
            bio: String::new(),
            role: Role::Farmer,
        }
    }
}

/// Partial profile update. Omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ProfileUpdate {
    /// Applies the present fields to `profile`.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(photo_url) = &self.photo_url {
            profile.photo_url = photo_url.clone();
        }
        if let Some(phone) = &self.phone {
            profile.phone = phone.clone();
        }
        if let Some(address) = &self.address {
            profile.address = address.clone();
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.clone();
        }
        if let Some(role) = self.role {
            profile.role = role;
        }
    }
}

/// Success body wrapper used by every endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Error body; `message` is optional because proxies may return bare text.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_reads_server_shape() {
        let json = r#"{
            "_id": "65a1",
            "name": "Rice",
            "type": "Grain",
            "pricePerUnit": 42.5,
            "unit": "kg",
            "quantity": 100,
            "description": "Aromatic",
            "location": "Bogura",
            "image": "",
            "owner": {"ownerEmail": "farmer@example.com", "ownerName": "Karim"},
            "createdAt": "2025-01-02T03:04:05Z"
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.id, "65a1");
        assert_eq!(listing.crop_type, CropType::Grain);
        assert_eq!(listing.unit, Unit::Kg);
        assert!(listing.image.is_none(), "empty image string maps to None");
        assert!(listing.is_owned_by("farmer@example.com"));
    }

    #[test]
    fn listing_input_never_serializes_created_at() {
        let input = ListingInput {
            name: "Mango".to_string(),
            crop_type: Some(CropType::Fruit),
            price_per_unit: 120.0,
            unit: Unit::Piece,
            quantity: 30.0,
            description: "Himsagar".to_string(),
            location: "Rajshahi".to_string(),
            image: None,
            owner: None,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["type"], "Fruit");
        assert_eq!(json["unit"], "piece");
        assert_eq!(json["pricePerUnit"], 120.0);
        assert!(json.get("createdAt").is_none());
        assert!(json.get("image").is_none());
    }

    #[test]
    fn crop_type_parses_display_names() {
        for t in CropType::ALL {
            assert_eq!(t.as_str().parse::<CropType>().unwrap(), t);
        }
        assert!("vegetable".parse::<CropType>().is_err());
    }

    #[test]
    fn only_pending_interests_transition() {
        use InterestStatus::*;
        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Accepted.can_transition_to(Accepted));
    }

    #[test]
    fn profile_defaults_missing_fields() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"email":"a@b.co","photoURL":"https://x.y/p.png"}"#).unwrap();
        assert_eq!(profile.role, Role::Farmer);
        assert_eq!(profile.photo_url, "https://x.y/p.png");
        assert!(profile.phone.is_empty());
    }

    #[test]
    fn profile_update_only_sends_present_fields() {
        let update = ProfileUpdate {
            phone: Some("01700000000".to_string()),
            ..ProfileUpdate::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"phone": "01700000000"}));

        let mut profile = UserProfile::bootstrap("a@b.co", "A", None);
        update.apply_to(&mut profile);
        assert_eq!(profile.phone, "01700000000");
        assert_eq!(profile.name, "A");
    }
}
