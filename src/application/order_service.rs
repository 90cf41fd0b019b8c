use bigdecimal::BigDecimal;

use crate::domain::cart::Cart;
use crate::domain::catalog::CatalogLookup;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    DeliveryAddress, Order, OrderDraft, OrderStats, OrderStatus, OrderStatusUpdate,
};
use crate::domain::payment::PaymentContext;
use crate::domain::ports::OrderApi;
use crate::domain::session::{Role, Session};

/// What checkout hands to the payment step.
#[derive(Debug, Clone)]
pub struct CheckoutHandoff {
    pub order: Order,
    pub amount: BigDecimal,
    pub currency: String,
}

impl CheckoutHandoff {
    pub fn order_id(&self) -> &str {
        &self.order.id
    }

    pub fn payment_context(&self, session: &Session) -> PaymentContext {
        PaymentContext {
            order_id: self.order.id.clone(),
            user_id: session.user_id().to_string(),
            amount: self.amount.clone(),
            currency: self.currency.clone(),
        }
    }
}

pub struct OrderService<O> {
    orders: O,
    currency: String,
}

impl<O: OrderApi> OrderService<O> {
    pub fn new(orders: O, currency: impl Into<String>) -> Self {
        Self {
            orders,
            currency: currency.into(),
        }
    }

    /// Validates locally, then creates the order. The amount to charge is the
    /// backend's total, or the cart total when the backend leaves it out.
    pub async fn checkout<L: CatalogLookup + ?Sized>(
        &self,
        session: &Session,
        address: DeliveryAddress,
        cart: &Cart,
        catalog: &L,
    ) -> Result<CheckoutHandoff, DomainError> {
        let draft =
            OrderDraft::from_cart(session.user_id(), &self.currency, address, cart, catalog)?;
        let local_total = draft.total();

        let order = self.orders.create_order(&draft).await?;
        let amount = order.total_amount.clone().unwrap_or(local_total);
        let currency = order.currency.clone().unwrap_or(draft.currency);
        log::info!(
            "Order {} created for user {}: {} {}",
            order.id,
            session.user_id(),
            amount,
            currency
        );
        Ok(CheckoutHandoff {
            order,
            amount,
            currency,
        })
    }

    pub async fn my_orders(&self, session: &Session) -> Result<Vec<Order>, DomainError> {
        Ok(self.orders.orders_for_user(session.user_id()).await?)
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, DomainError> {
        self.orders.get_order(id).await.map_err(|e| {
            if e.is_not_found() {
                DomainError::NotFound
            } else {
                e.into()
            }
        })
    }

    pub async fn all_orders(&self, session: &Session) -> Result<Vec<Order>, DomainError> {
        session.require_role(&[Role::Vendor, Role::Admin])?;
        Ok(self.orders.list_orders().await?)
    }

    pub async fn update_status(
        &self,
        session: &Session,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, DomainError> {
        session.require_role(&[Role::Vendor, Role::Admin])?;
        let update = OrderStatusUpdate {
            order_status: Some(status),
            payment_status: None,
        };
        Ok(self.orders.update_status(id, &update).await?)
    }

    pub async fn cancel(&self, id: &str) -> Result<Order, DomainError> {
        let order = self.orders.cancel_order(id).await?;
        log::info!("Order {} cancelled", order.id);
        Ok(order)
    }

    pub async fn stats(&self, session: &Session) -> Result<OrderStats, DomainError> {
        session.require_role(&[Role::Admin])?;
        Ok(self.orders.order_stats().await?)
    }
}
