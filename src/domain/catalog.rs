use std::cmp::Ordering;
use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::money;
use super::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    Disponible,
    RuptureStock,
    EnPromotion,
    Desactive,
}

impl ProductStatus {
    /// Whether a buyer can put the product in a cart.
    pub fn is_purchasable(self) -> bool {
        matches!(self, ProductStatus::Disponible | ProductStatus::EnPromotion)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    #[serde(rename = "vendeurId", default)]
    pub vendor_id: Option<String>,
    #[serde(rename = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "prix", with = "money::as_number")]
    pub price: BigDecimal,
    #[serde(rename = "categorie", default)]
    pub category: Option<String>,
    #[serde(rename = "marque", default)]
    pub brand: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub specifications: HashMap<String, String>,
    #[serde(default = "default_status")]
    pub status: ProductStatus,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
    #[serde(deserialize_with = "timestamp::lenient", default)]
    pub created_at: Option<NaiveDateTime>,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_status() -> ProductStatus {
    ProductStatus::Disponible
}

impl Product {
    /// `imageUrl` wins over `image` when both are present.
    pub fn display_image(&self) -> Option<&str> {
        self.image_url.as_deref().or(self.image.as_deref())
    }
}

/// Body of `POST /produits` and `PUT /produits/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDraft {
    #[serde(rename = "vendeurId")]
    pub vendor_id: String,
    #[serde(rename = "titre")]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "prix", with = "money::as_number")]
    pub price: BigDecimal,
    #[serde(rename = "categorie")]
    pub category: Option<String>,
    #[serde(rename = "marque")]
    pub brand: Option<String>,
    pub currency: String,
    pub image: Option<String>,
    pub stock: i32,
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

/// Read access to whatever catalog detail the caller has loaded so far.
pub trait CatalogLookup {
    fn product(&self, product_id: &str) -> Option<&Product>;
}

impl CatalogLookup for HashMap<String, Product> {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.get(product_id)
    }
}

impl CatalogLookup for [Product] {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.iter().find(|p| p.id == product_id)
    }
}

impl CatalogLookup for Vec<Product> {
    fn product(&self, product_id: &str) -> Option<&Product> {
        self.as_slice().product(product_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Relevance,
    PriceAsc,
    PriceDesc,
    Title,
    Newest,
}

/// Client-side narrowing of an already fetched product list.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub max_price: Option<BigDecimal>,
    pub purchasable_only: bool,
    pub sort: SortKey,
}

impl CatalogFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(keyword) = self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            let needle = keyword.to_lowercase();
            let in_title = product.title.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !product
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(category))
            {
                return false;
            }
        }
        if let Some(max) = &self.max_price {
            if &product.price > max {
                return false;
            }
        }
        !self.purchasable_only || (product.status.is_purchasable() && product.stock > 0)
    }

    /// Filters then sorts. `Relevance` keeps the backend order.
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        let mut out: Vec<Product> = products.iter().filter(|p| self.matches(p)).cloned().collect();
        match self.sort {
            SortKey::Relevance => {}
            SortKey::PriceAsc => out.sort_by(|a, b| a.price.cmp(&b.price)),
            SortKey::PriceDesc => out.sort_by(|a, b| b.price.cmp(&a.price)),
            SortKey::Title => out.sort_by_key(|p| p.title.to_lowercase()),
            SortKey::Newest => out.sort_by(|a, b| match (a.created_at, b.created_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }),
        }
        out
    }
}

#[cfg(test)]
pub(crate) fn sample_product(id: &str, title: &str, price: &str) -> Product {
    Product {
        id: id.to_string(),
        vendor_id: Some("v1".to_string()),
        title: title.to_string(),
        description: None,
        price: money::parse_amount(price).expect("valid price"),
        category: None,
        brand: None,
        currency: "USD".to_string(),
        specifications: HashMap::new(),
        status: ProductStatus::Disponible,
        image: None,
        image_url: None,
        stock: 10,
        created_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_backend_product() {
        let product: Product = serde_json::from_value(json!({
            "id": "65f0c",
            "vendeurId": "uid-1",
            "titre": "Pagne wax",
            "prix": 12.5,
            "categorie": "Mode",
            "status": "EN_PROMOTION",
            "image": "https://img/1.png",
            "stock": 4,
            "createdAt": "2024-05-01T10:15:00"
        }))
        .expect("valid product");

        assert_eq!(product.title, "Pagne wax");
        assert_eq!(product.currency, "USD");
        assert_eq!(product.status, ProductStatus::EnPromotion);
        assert_eq!(product.display_image(), Some("https://img/1.png"));
        assert!(product.created_at.is_some());
    }

    #[test]
    fn keyword_matches_title_and_description() {
        let mut shoes = sample_product("p1", "Running shoes", "40");
        shoes.description = Some("Light trail model".to_string());
        let hat = sample_product("p2", "Hat", "5");
        let filter = CatalogFilter {
            keyword: Some("TRAIL".to_string()),
            ..Default::default()
        };

        let out = filter.apply(&[shoes, hat]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "p1");
    }

    #[test]
    fn price_ceiling_and_availability() {
        let cheap = sample_product("p1", "Cheap", "3");
        let mut gone = sample_product("p2", "Gone", "2");
        gone.status = ProductStatus::RuptureStock;
        let pricey = sample_product("p3", "Pricey", "300");
        let mut sold_out = sample_product("p4", "Sold out", "1");
        sold_out.stock = 0;
        let filter = CatalogFilter {
            max_price: money::parse_amount("10"),
            purchasable_only: true,
            ..Default::default()
        };

        let ids: Vec<_> = filter
            .apply(&[cheap, gone, pricey, sold_out])
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["p1"]);
    }

    #[test]
    fn sorts_by_price_descending() {
        let products = vec![
            sample_product("a", "A", "5"),
            sample_product("b", "B", "50"),
            sample_product("c", "C", "0.5"),
        ];
        let filter = CatalogFilter {
            sort: SortKey::PriceDesc,
            ..Default::default()
        };
        let ids: Vec<_> = filter.apply(&products).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn draft_uses_backend_field_names() {
        let draft = ProductDraft {
            vendor_id: "v1".to_string(),
            title: "Lampe solaire".to_string(),
            description: None,
            price: money::parse_amount("24.90").expect("price"),
            category: Some("Maison".to_string()),
            brand: None,
            currency: "CDF".to_string(),
            image: None,
            stock: 5,
        };

        let body = serde_json::to_value(&draft).expect("serializable");
        assert_eq!(body["vendeurId"], "v1");
        assert_eq!(body["titre"], "Lampe solaire");
        assert_eq!(body["prix"].as_f64(), Some(24.9));
        assert_eq!(body["categorie"], "Maison");
        assert_eq!(body["stock"], 5);
        assert!(body.get("title").is_none());
    }

    #[test]
    fn slice_lookup_finds_by_id() {
        let products = vec![sample_product("a", "A", "1")];
        assert!(products.product("a").is_some());
        assert!(products.product("zz").is_none());
    }
}
