use async_trait::async_trait;
use reqwest::Method;

use crate::domain::errors::RemoteError;
use crate::domain::payment::{PaymentRecord, PaymentRequest, ProviderResponse};
use crate::domain::ports::PaymentApi;

use super::http::ApiClient;
use super::models::{FailPaymentBody, PaidDto};

#[async_trait]
impl PaymentApi for ApiClient {
    async fn create_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRecord, RemoteError> {
        self.send_json(Method::POST, self.endpoint(&["paiements"]), request)
            .await
    }

    async fn confirm_payment(
        &self,
        payment_id: &str,
        ack: &ProviderResponse,
    ) -> Result<PaymentRecord, RemoteError> {
        self.send_json(
            Method::POST,
            self.endpoint(&["paiements", payment_id, "confirm"]),
            ack,
        )
        .await
    }

    async fn fail_payment(
        &self,
        payment_id: &str,
        reason: &str,
    ) -> Result<PaymentRecord, RemoteError> {
        self.send_json(
            Method::POST,
            self.endpoint(&["paiements", payment_id, "fail"]),
            &FailPaymentBody { reason },
        )
        .await
    }

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentRecord, RemoteError> {
        self.get_json(self.endpoint(&["paiements", payment_id])).await
    }

    async fn payments_for_order(&self, order_id: &str) -> Result<Vec<PaymentRecord>, RemoteError> {
        self.get_json(self.endpoint(&["paiements", "order", order_id]))
            .await
    }

    async fn is_order_paid(&self, order_id: &str) -> Result<bool, RemoteError> {
        let paid: PaidDto = self
            .get_json(self.endpoint(&["paiements", "order", order_id, "paid"]))
            .await?;
        Ok(paid.is_paid())
    }
}
