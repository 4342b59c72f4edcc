//! Inter-participant message model.
//!
//! A [`Message`] is addressed (`from`/`to`), typed (`kind`, `"type"` on
//! the wire), and carries an opaque JSON payload. The concrete payloads
//! exchanged by the demo participants are defined here as typed structs
//! that convert to and from the generic envelope.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{Participant, Product};

/// Addressed, typed, ephemeral message. No identity beyond its fields,
/// no persistence; it exists only while held by the bus slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub from: Participant,
    pub to: Participant,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Value,
}

impl Message {
    /// Create a message with an opaque payload.
    #[must_use]
    pub fn new(
        from: Participant,
        to: Participant,
        kind: impl Into<String>,
        content: Value,
    ) -> Self {
        Self {
            from,
            to,
            kind: kind.into(),
            content,
        }
    }

    /// Structural match used by bus subscriptions: sender and kind only.
    #[must_use]
    pub fn matches(&self, from: Participant, kind: &str) -> bool {
        self.from == from && self.kind == kind
    }

    /// Structural equality for redelivery detection: same `from`, `to`
    /// and `kind`, payload ignored.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.from == other.from && self.to == other.to && self.kind == other.kind
    }
}

/// A typed payload that travels inside a [`Message`] envelope.
pub trait Payload: Serialize + DeserializeOwned {
    /// Wire value of the envelope's `type` field.
    const KIND: &'static str;

    /// Wrap the payload into an addressed envelope.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be serialized to JSON.
    fn to_message(&self, from: Participant, to: Participant) -> Result<Message, serde_json::Error> {
        Ok(Message::new(from, to, Self::KIND, serde_json::to_value(self)?))
    }

    /// Extract the payload from an envelope of the matching kind.
    ///
    /// # Errors
    /// Returns an error if the envelope kind differs or the payload does
    /// not deserialize.
    fn from_message(message: &Message) -> Result<Self, serde_json::Error> {
        if message.kind != Self::KIND {
            return Err(serde::de::Error::custom(format!(
                "expected kind {:?}, got {:?}",
                Self::KIND,
                message.kind
            )));
        }
        serde_json::from_value(message.content.clone())
    }
}

/// Products → host: put a product in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddToCart {
    pub product: Product,
    pub quantity: u32,
}

impl Payload for AddToCart {
    const KIND: &'static str = "add-to-cart";
}

/// Cart view → host: mutate an existing cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum CartOperation {
    Remove {
        #[serde(rename = "productId")]
        product_id: String,
    },
    Update {
        #[serde(rename = "productId")]
        product_id: String,
        quantity: u32,
    },
    Clear,
}

impl Payload for CartOperation {
    const KIND: &'static str = "cart-operation";
}

/// Host → header: the badge count changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCountUpdated {
    pub count: u32,
    /// Unix epoch milliseconds at publish time.
    pub timestamp: i64,
}

impl CartCountUpdated {
    /// Build an update stamped with the current time.
    #[must_use]
    pub fn now(count: u32) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self { count, timestamp }
    }
}

impl Payload for CartCountUpdated {
    const KIND: &'static str = "cart-count-updated";
}

/// Header → host: route change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigate {
    pub path: String,
}

impl Payload for Navigate {
    const KIND: &'static str = "navigate";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wire_shape() {
        let msg = Message::new(
            Participant::Header,
            Participant::Shell,
            "navigate",
            serde_json::json!({"path": "/products"}),
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["from"], "header");
        assert_eq!(json["content"]["path"], "/products");
    }

    #[test]
    fn test_cart_operation_wire_shape() {
        let op = CartOperation::Update {
            product_id: "3".into(),
            quantity: 2,
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["operation"], "update");
        assert_eq!(json["productId"], "3");
        assert_eq!(json["quantity"], 2);

        let clear: CartOperation = serde_json::from_value(serde_json::json!({
            "operation": "clear"
        }))
        .unwrap();
        assert_eq!(clear, CartOperation::Clear);
    }

    #[test]
    fn test_payload_roundtrip_through_envelope() {
        let payload = AddToCart {
            product: crate::demo_catalog()[0].clone(),
            quantity: 2,
        };
        let msg = payload
            .to_message(Participant::Products, Participant::Cart)
            .unwrap();
        assert_eq!(msg.kind, "add-to-cart");

        let back = AddToCart::from_message(&msg).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_from_message_rejects_wrong_kind() {
        let msg = Message::new(
            Participant::Shell,
            Participant::Header,
            "cart-count-updated",
            serde_json::json!({"count": 1, "timestamp": 0}),
        );
        assert!(Navigate::from_message(&msg).is_err());
    }

    #[test]
    fn test_same_shape_ignores_payload() {
        let a = Message::new(
            Participant::Shell,
            Participant::Header,
            "cart-count-updated",
            serde_json::json!({"count": 1}),
        );
        let mut b = a.clone();
        b.content = serde_json::json!({"count": 7});
        assert!(a.same_shape(&b));
        assert!(!a.matches(Participant::Header, "cart-count-updated"));
    }
}
