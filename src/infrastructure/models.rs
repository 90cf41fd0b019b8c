//! Wire shapes that only exist at the HTTP boundary.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::cart::CartLine;
use crate::domain::catalog::Page;
use crate::domain::session::{Role, UserProfile};
use crate::domain::timestamp;
use crate::schema::local_entries;

// ── Local storage rows ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = local_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LocalEntryRow {
    pub key: String,
    pub value: String,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = local_entries)]
pub struct NewLocalEntryRow<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub updated_at: NaiveDateTime,
}

// ── Error bodies ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Cart ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AddToCartBody<'a> {
    #[serde(rename = "produitId")]
    pub product_id: &'a str,
    #[serde(rename = "quantite")]
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateQuantityBody {
    #[serde(rename = "quantite")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CartItemDto {
    #[serde(rename = "produitId")]
    pub product_id: String,
    #[serde(rename = "quantite")]
    pub quantity: u32,
    #[serde(rename = "updatedAt", deserialize_with = "timestamp::lenient", default)]
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct CartDto {
    #[serde(default)]
    pub items: Vec<CartItemDto>,
}

impl CartDto {
    pub fn into_lines(self) -> Vec<CartLine> {
        self.items
            .into_iter()
            .map(|i| CartLine {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: None,
                title: None,
                image: None,
                updated_at: i.updated_at.map(timestamp::to_utc).unwrap_or_else(Utc::now),
            })
            .collect()
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

/// Spring `Page` body, or a bare array from the non-paginated endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PageDto<T> {
    Paged {
        content: Vec<T>,
        #[serde(rename = "totalElements", default)]
        total_elements: Option<i64>,
        #[serde(default)]
        number: Option<i64>,
        #[serde(default)]
        size: Option<i64>,
    },
    Plain(Vec<T>),
}

impl<T> PageDto<T> {
    pub fn into_page(self, requested_page: i64, requested_size: i64) -> Page<T> {
        match self {
            PageDto::Paged {
                content,
                total_elements,
                number,
                size,
            } => Page {
                total: total_elements.unwrap_or(content.len() as i64),
                page: number.unwrap_or(requested_page),
                size: size.unwrap_or(requested_size),
                items: content,
            },
            PageDto::Plain(items) => Page {
                total: items.len() as i64,
                page: requested_page,
                size: requested_size,
                items,
            },
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            PageDto::Paged { content, .. } => content,
            PageDto::Plain(items) => items,
        }
    }
}

// ── Payments ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FailPaymentBody<'a> {
    pub reason: &'a str,
}

/// `GET /paiements/order/{id}/paid` answers either a bare boolean or an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PaidDto {
    Flag(bool),
    Object {
        #[serde(alias = "isPaid")]
        paid: bool,
    },
}

impl PaidDto {
    pub fn is_paid(&self) -> bool {
        match self {
            PaidDto::Flag(b) => *b,
            PaidDto::Object { paid } => *paid,
        }
    }
}

// ── Users ─────────────────────────────────────────────────────────────────────

/// `POST /users/register` answers `{ token, user }`, older deployments the bare profile.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RegisterResponseDto {
    WithToken {
        #[serde(default)]
        token: Option<String>,
        user: UserProfile,
    },
    Profile(UserProfile),
}

impl RegisterResponseDto {
    pub fn into_parts(self) -> (Option<String>, UserProfile) {
        match self {
            RegisterResponseDto::WithToken { token, user } => (token, user),
            RegisterResponseDto::Profile(user) => (None, user),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleBody {
    pub role: Role,
}
