use serde::{Deserialize, Serialize};

/// A catalog entry as stored and returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Identifier assigned by the store, never reused
    pub id: i64,
    /// Display name of the item
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Optional tax amount
    pub tax: Option<f64>,
}

impl Item {
    /// Combine an allocated identifier with validated creation input
    pub fn from_create(id: i64, input: ItemCreate) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            price: input.price,
            tax: input.tax,
        }
    }
}

/// Input accepted when creating an item
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub tax: Option<f64>,
}

/// Response body for the health check endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "FastAPI is running!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_serializes_absent_optionals_as_null() {
        let item = Item {
            id: 4,
            name: "Monitor".to_string(),
            description: None,
            price: 199.99,
            tax: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 4,
                "name": "Monitor",
                "description": null,
                "price": 199.99,
                "tax": null
            })
        );
    }

    #[test]
    fn test_item_from_create_keeps_fields() {
        let input = ItemCreate {
            name: "Desk".to_string(),
            description: Some("Standing desk".to_string()),
            price: 350.0,
            tax: Some(35.0),
        };
        let item = Item::from_create(7, input);
        assert_eq!(item.id, 7);
        assert_eq!(item.name, "Desk");
        assert_eq!(item.description.as_deref(), Some("Standing desk"));
        assert_eq!(item.price, 350.0);
        assert_eq!(item.tax, Some(35.0));
    }

    #[test]
    fn test_item_create_defaults_optionals() {
        let input: ItemCreate = serde_json::from_str(r#"{"name":"Cable","price":5.5}"#).unwrap();
        assert_eq!(input.name, "Cable");
        assert!(input.description.is_none());
        assert!(input.tax.is_none());
    }

    #[test]
    fn test_health_response_ok() {
        let health = HealthResponse::ok();
        assert_eq!(health.status, "ok");
        assert_eq!(health.message, "FastAPI is running!");
    }
}
