use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::catalog::CatalogLookup;
use super::errors::ValidationError;
use super::money;
use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    EnAttente,
    EnCours,
    EnRoute,
    Livre,
    Annule,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    EnAttente,
    Succes,
    Echoue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    #[serde(rename = "pays", default)]
    pub country: Option<String>,
    #[serde(rename = "province", default)]
    pub province: Option<String>,
    #[serde(rename = "ville")]
    pub city: String,
    #[serde(rename = "commune", default)]
    pub commune: Option<String>,
    #[serde(rename = "quartier")]
    pub neighborhood: String,
    #[serde(rename = "avenue", default)]
    pub street: Option<String>,
    #[serde(rename = "reference", default)]
    pub landmark: Option<String>,
    #[serde(rename = "telephone")]
    pub phone: String,
    #[serde(rename = "nomDestinataire", default)]
    pub recipient_name: Option<String>,
}

impl DeliveryAddress {
    /// Phone, city and neighborhood must be non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("phone", &self.phone),
            ("city", &self.city),
            ("neighborhood", &self.neighborhood),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingAddressField(name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "produitId")]
    pub product_id: String,
    #[serde(rename = "produitTitre")]
    pub title: String,
    #[serde(rename = "produitImage", default)]
    pub image: Option<String>,
    #[serde(rename = "quantite")]
    pub quantity: u32,
    #[serde(rename = "prixUnitaire", with = "money::as_number")]
    pub unit_price: BigDecimal,
}

/// Body of `POST /orders`, assembled from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDraft {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub currency: String,
    #[serde(rename = "adresseLivraison")]
    pub delivery_address: DeliveryAddress,
    pub items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OrderDraft {
    /// Validates the address and resolves every line's display fields and
    /// price through the catalog fallback.
    pub fn from_cart<L: CatalogLookup + ?Sized>(
        user_id: &str,
        currency: &str,
        address: DeliveryAddress,
        cart: &Cart,
        catalog: &L,
    ) -> Result<Self, ValidationError> {
        address.validate()?;
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let items = cart
            .views(catalog)
            .into_iter()
            .map(|v| OrderItem {
                product_id: v.product_id,
                title: v.title,
                image: v.image,
                quantity: v.quantity,
                unit_price: v.unit_price,
            })
            .collect();
        Ok(Self {
            user_id: user_id.to_string(),
            currency: currency.to_string(),
            delivery_address: address,
            items,
            notes: None,
        })
    }

    pub fn total(&self) -> BigDecimal {
        self.items
            .iter()
            .map(|i| i.unit_price.clone() * BigDecimal::from(i.quantity))
            .fold(money::zero(), |acc, x| acc + x)
    }
}

/// The order as the backend reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "montantTotal", with = "money::opt_as_number", default)]
    pub total_amount: Option<BigDecimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(rename = "paiementStatus", default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub order_status: Option<OrderStatus>,
    #[serde(rename = "adresseLivraison", default)]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(deserialize_with = "timestamp::lenient", default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Body of `PATCH /orders/{id}/status`. Either field may be left out.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    #[serde(rename = "paiementStatus", skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: i64,
    #[serde(default)]
    pub en_attente: i64,
    #[serde(default)]
    pub en_cours: i64,
    #[serde(default)]
    pub en_route: i64,
    #[serde(default)]
    pub livre: i64,
    #[serde(default)]
    pub annule: i64,
    #[serde(rename = "revenus", with = "money::opt_as_number", default)]
    pub revenue: Option<BigDecimal>,
}

#[cfg(test)]
pub(crate) fn sample_address(phone: &str, city: &str, neighborhood: &str) -> DeliveryAddress {
    DeliveryAddress {
        city: city.to_string(),
        neighborhood: neighborhood.to_string(),
        phone: phone.to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::domain::catalog::{sample_product, Product};

    #[test]
    fn blank_phone_is_rejected() {
        let address = sample_address("", "Kinshasa", "Gombe");
        assert_eq!(
            address.validate(),
            Err(ValidationError::MissingAddressField("phone"))
        );
    }

    #[test]
    fn whitespace_counts_as_blank() {
        let address = sample_address("+243 900", "Kinshasa", "   ");
        assert_eq!(
            address.validate(),
            Err(ValidationError::MissingAddressField("neighborhood"))
        );
    }

    #[test]
    fn draft_resolves_lines_through_catalog() {
        let mut cart = Cart::new();
        cart.add(&sample_product("p1", "Widget", "10"), 2, Utc::now());
        let catalog: HashMap<String, Product> = HashMap::new();

        let draft = OrderDraft::from_cart(
            "u1",
            "USD",
            sample_address("+243 900", "Kinshasa", "Gombe"),
            &cart,
            &catalog,
        )
        .expect("valid draft");

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].title, "Widget");
        assert_eq!(money::format_amount(&draft.total()), "20.00");

        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(body["adresseLivraison"]["ville"], "Kinshasa");
        assert_eq!(body["items"][0]["quantite"], 2);
        assert!(body.get("notes").is_none());
    }

    #[test]
    fn empty_cart_cannot_be_ordered() {
        let catalog: HashMap<String, Product> = HashMap::new();
        let err = OrderDraft::from_cart(
            "u1",
            "USD",
            sample_address("+243 900", "Kinshasa", "Gombe"),
            &Cart::new(),
            &catalog,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::EmptyCart);
    }

    #[test]
    fn deserializes_backend_order() {
        let order: Order = serde_json::from_value(json!({
            "id": "o-1",
            "userId": "u1",
            "montantTotal": 45.0,
            "currency": "USD",
            "paiementStatus": "EN_ATTENTE",
            "orderStatus": "EN_COURS",
            "items": []
        }))
        .expect("valid order");
        assert_eq!(order.order_status, Some(OrderStatus::EnCours));
        assert_eq!(order.payment_status, Some(PaymentStatus::EnAttente));
        assert_eq!(
            order.total_amount.as_ref().map(money::format_amount).as_deref(),
            Some("45.00")
        );
    }
}
