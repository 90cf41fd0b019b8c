use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{CatalogLookup, Product};
use super::money;

pub const UNKNOWN_PRODUCT_TITLE: &str = "Unknown product";
pub const DEFAULT_CURRENCY: &str = "USD";

/// One product in the cart. Display fields are captured when the line is
/// created locally and may be missing on lines that came from the remote cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(rename = "produitId")]
    pub product_id: String,
    #[serde(rename = "quantite")]
    pub quantity: u32,
    #[serde(rename = "prixUnitaire", with = "money::opt_as_number", default)]
    pub unit_price: Option<BigDecimal>,
    #[serde(rename = "produitTitre", default)]
    pub title: Option<String>,
    #[serde(rename = "produitImage", default)]
    pub image: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    /// Captured price, then catalog price, then zero. A zero captured price
    /// counts as missing.
    pub fn effective_price<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> BigDecimal {
        self.unit_price
            .clone()
            .filter(|p| !p.is_zero())
            .or_else(|| {
                catalog
                    .product(&self.product_id)
                    .map(|p| p.price.clone())
                    .filter(|p| !p.is_zero())
            })
            .unwrap_or_else(BigDecimal::zero)
    }

    pub fn view<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> CartLineView {
        let product = catalog.product(&self.product_id);
        let unit_price = self.effective_price(catalog);
        CartLineView {
            product_id: self.product_id.clone(),
            title: self
                .title
                .clone()
                .or_else(|| product.map(|p| p.title.clone()))
                .unwrap_or_else(|| UNKNOWN_PRODUCT_TITLE.to_string()),
            image: self
                .image
                .clone()
                .or_else(|| product.and_then(|p| p.display_image().map(str::to_string))),
            currency: product
                .map(|p| p.currency.clone())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            line_total: unit_price.clone() * BigDecimal::from(self.quantity),
            unit_price,
            quantity: self.quantity,
        }
    }
}

/// A cart line with every display field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineView {
    pub product_id: String,
    pub title: String,
    pub image: Option<String>,
    pub unit_price: BigDecimal,
    pub currency: String,
    pub quantity: u32,
    pub line_total: BigDecimal,
}

/// Lines in insertion order, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.items.iter().find(|l| l.product_id == product_id)
    }

    pub fn total_item_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Adds `quantity` units, merging into an existing line for the same
    /// product. A merged quantity saturates at `u32::MAX`.
    pub fn add(&mut self, product: &Product, quantity: u32, now: DateTime<Utc>) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                line.updated_at = now;
            }
            None => self.items.push(CartLine {
                product_id: product.id.clone(),
                quantity,
                unit_price: Some(product.price.clone()),
                title: Some(product.title.clone()),
                image: product.display_image().map(str::to_string),
                updated_at: now,
            }),
        }
    }

    /// A quantity below one removes the line. Unknown products are ignored.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64, now: DateTime<Utc>) {
        let Ok(quantity) = u32::try_from(quantity) else {
            self.remove(product_id);
            return;
        };
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.items.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
            line.updated_at = now;
        }
    }

    pub fn remove(&mut self, product_id: &str) {
        self.items.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> BigDecimal {
        self.items
            .iter()
            .map(|l| l.effective_price(catalog) * BigDecimal::from(l.quantity))
            .fold(BigDecimal::zero(), |acc, x| acc + x)
    }

    pub fn views<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> Vec<CartLineView> {
        self.items.iter().map(|l| l.view(catalog)).collect()
    }

    /// Products with neither a captured title nor a loaded catalog entry.
    pub fn missing_product_ids<L: CatalogLookup + ?Sized>(&self, catalog: &L) -> Vec<String> {
        self.items
            .iter()
            .filter(|l| l.title.is_none() && catalog.product(&l.product_id).is_none())
            .map(|l| l.product_id.clone())
            .collect()
    }

    /// Replaces the contents with the remote cart. Lines and quantities come
    /// from `remote`; display fields captured locally are kept for products
    /// the remote copy does not describe.
    pub fn adopt_remote(&mut self, remote: Vec<CartLine>) {
        let previous = std::mem::take(&mut self.items);
        let mut merged: Vec<CartLine> = Vec::with_capacity(remote.len());
        for mut line in remote {
            if line.quantity == 0 || merged.iter().any(|l| l.product_id == line.product_id) {
                continue;
            }
            if let Some(old) = previous.iter().find(|l| l.product_id == line.product_id) {
                line.unit_price = line.unit_price.or_else(|| old.unit_price.clone());
                line.title = line.title.or_else(|| old.title.clone());
                line.image = line.image.or_else(|| old.image.clone());
            }
            merged.push(line);
        }
        self.items = merged;
    }

    /// Captures display fields for `product` on its line, if present and not
    /// already captured.
    pub fn capture_details(&mut self, product: &Product) {
        if let Some(line) = self.items.iter_mut().find(|l| l.product_id == product.id) {
            if line.unit_price.is_none() {
                line.unit_price = Some(product.price.clone());
            }
            if line.title.is_none() {
                line.title = Some(product.title.clone());
            }
            if line.image.is_none() {
                line.image = product.display_image().map(str::to_string);
            }
        }
    }
}
