use chrono::{DateTime, Local, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Newtype Wrappers - Temporal
// =============================================================================

/// Unix timestamp in seconds since epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }

    /// Wall-clock `HH:MM` in the local timezone, as shown next to a message.
    pub fn display_time(&self) -> String {
        self.to_datetime()
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string()
    }
}

// =============================================================================
// Identity
// =============================================================================

/// The signed-in shopper the widget was mounted for.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Identity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
        }
    }

    /// Whether an email address is known for this identity at all.
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

// =============================================================================
// Product payload
// =============================================================================

/// An optional field of a backend payload, tracking presence separately from value.
///
/// `Null` means the key was sent with a JSON `null`; `Unparsed` keeps a value
/// whose JSON type did not match the expected one.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Value(T),
    Unparsed(serde_json::Value),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// The key was sent, whatever its value.
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        if raw.is_null() {
            return Ok(Field::Null);
        }
        Ok(match serde_json::from_value::<T>(raw.clone()) {
            Ok(v) => Field::Value(v),
            Err(_) => Field::Unparsed(raw),
        })
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Absent | Field::Null => serializer.serialize_none(),
            Field::Value(v) => v.serialize(serializer),
            Field::Unparsed(raw) => raw.serialize(serializer),
        }
    }
}

/// A product record returned by the inference backend.
///
/// No key is required; a missing key stays [`Field::Absent`]. Keys the
/// assistant does not know about are kept in `extra` so they survive a round
/// trip to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub name: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub price: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub original_price: Field<f64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub rating: Field<f64>,
    /// Review count as the agent service sends it.
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub reviews: Field<u64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub review_count: Field<u64>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub in_stock: Field<bool>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub category: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub description: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub site: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub link: Field<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Product {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Field::Value(name.into()),
            price: Field::Absent,
            original_price: Field::Absent,
            rating: Field::Absent,
            reviews: Field::Absent,
            review_count: Field::Absent,
            in_stock: Field::Absent,
            category: Field::Absent,
            description: Field::Absent,
            site: Field::Absent,
            link: Field::Absent,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Field::Value(price);
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Field::Value(rating);
        self
    }

    /// Number of reviews from `reviews`, else `reviewCount`.
    pub fn review_total(&self) -> Option<u64> {
        self.reviews.value().or(self.review_count.value()).copied()
    }

    /// Whether either review key was sent.
    pub fn has_reviews(&self) -> bool {
        self.reviews.is_present() || self.review_count.is_present()
    }
}
