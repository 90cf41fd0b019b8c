use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, RemoteError, ValidationError};
use crate::domain::order::PaymentStatus;
use crate::domain::payment::{
    PaymentContext, PaymentRecord, PaymentRequest, PaymentResult, PaymentSelector,
    ProviderResponse, PROVIDER_SUCCESS_MESSAGE,
};
use crate::domain::ports::PaymentApi;

/// Simulated provider latency between creating and confirming a payment.
pub const PROCESSING_DELAY: Duration = Duration::from_secs(2);

/// Payments recorded against one order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPayments {
    pub records: Vec<PaymentRecord>,
    pub paid: bool,
}

/// Drives one payment attempt against the payment service: create, wait,
/// confirm. There is no real provider; the client sends the acknowledgment
/// a provider callback would have sent.
pub struct PaymentFlow<P> {
    payments: P,
}

impl<P: PaymentApi> PaymentFlow<P> {
    pub fn new(payments: P) -> Self {
        Self { payments }
    }

    /// Runs exactly one of `on_success` / `on_error`. Nothing is retried.
    pub async fn submit_payment<S, E>(
        &self,
        request: &PaymentRequest,
        on_success: S,
        on_error: E,
    ) -> PaymentResult
    where
        S: FnOnce(&PaymentRecord),
        E: FnOnce(&RemoteError),
    {
        let pending = match self.payments.create_payment(request).await {
            Ok(record) => record,
            Err(e) => return Self::fail(request, e, on_error),
        };
        log::info!(
            "Payment {} created for order {} ({} {}), waiting for provider",
            pending.id,
            pending.order_id,
            request.amount(),
            request.currency()
        );

        tokio::time::sleep(PROCESSING_DELAY).await;

        let ack = ProviderResponse {
            message: PROVIDER_SUCCESS_MESSAGE.to_string(),
            transaction_id: transaction_id_for(&pending),
            timestamp: Utc::now(),
        };
        match self.payments.confirm_payment(&pending.id, &ack).await {
            Ok(confirmed) => {
                let reference = confirmed
                    .transaction_reference
                    .clone()
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or(ack.transaction_id);
                log::info!("Payment {} confirmed, reference {}", confirmed.id, reference);
                on_success(&confirmed);
                PaymentResult::success(reference, confirmed.provider_response)
            }
            Err(e) => Self::fail(request, e, on_error),
        }
    }

    /// Submits the selector's details, runs the payment and moves the
    /// selector to its result step.
    pub async fn run<S, E>(
        &self,
        selector: &mut PaymentSelector,
        context: &PaymentContext,
        on_success: S,
        on_error: E,
    ) -> Result<PaymentResult, ValidationError>
    where
        S: FnOnce(&PaymentRecord),
        E: FnOnce(&RemoteError),
    {
        let request = selector.submit(context)?;
        let result = self.submit_payment(&request, on_success, on_error).await;
        selector.complete(result.clone())?;
        Ok(result)
    }

    pub async fn payment(&self, payment_id: &str) -> Result<PaymentRecord, DomainError> {
        match self.payments.get_payment(payment_id).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_not_found() => Err(DomainError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn order_payments(&self, order_id: &str) -> Result<OrderPayments, DomainError> {
        let records = self.payments.payments_for_order(order_id).await?;
        let paid = self.payments.is_order_paid(order_id).await?;
        Ok(OrderPayments { records, paid })
    }

    /// Marks a pending payment as failed. Settled payments are left alone.
    pub async fn abandon(
        &self,
        payment_id: &str,
        reason: &str,
    ) -> Result<PaymentRecord, DomainError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DomainError::InvalidInput("a reason is required".to_string()));
        }
        let record = self.payment(payment_id).await?;
        if matches!(record.status, Some(PaymentStatus::Succes | PaymentStatus::Echoue)) {
            return Err(DomainError::InvalidInput(format!(
                "payment {} is already settled",
                record.id
            )));
        }
        let failed = self.payments.fail_payment(payment_id, reason).await?;
        log::info!("Payment {} marked failed: {}", failed.id, reason);
        Ok(failed)
    }

    fn fail<E>(request: &PaymentRequest, error: RemoteError, on_error: E) -> PaymentResult
    where
        E: FnOnce(&RemoteError),
    {
        log::error!(
            "Payment for order {} via {} failed: {}",
            request.order_id(),
            request.method().code(),
            error
        );
        let message = error.server_message().map(str::to_string);
        on_error(&error);
        PaymentResult::failure(message)
    }
}

fn transaction_id_for(record: &PaymentRecord) -> String {
    record
        .transaction_reference
        .clone()
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| format!("SIM-{}", Uuid::new_v4().simple()))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::str::FromStr;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::payment::{
        PaymentMethod, PaymentStep, PAYMENT_FAILURE_MESSAGE, PAYMENT_SUCCESS_MESSAGE,
    };
    use crate::domain::ports::MockPaymentApi;

    fn context() -> PaymentContext {
        PaymentContext {
            order_id: "o-1".to_string(),
            user_id: "u-1".to_string(),
            amount: BigDecimal::from_str("45.00").unwrap(),
            currency: "USD".to_string(),
        }
    }

    fn record(reference: Option<&str>, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord {
            id: "pay-1".to_string(),
            order_id: "o-1".to_string(),
            user_id: "u-1".to_string(),
            amount: BigDecimal::from_str("45.00").unwrap(),
            currency: Some("USD".to_string()),
            method: PaymentMethod::Mpesa,
            status: Some(status),
            transaction_reference: reference.map(str::to_string),
            provider_response: None,
            created_at: None,
        }
    }

    fn mpesa_request() -> PaymentRequest {
        PaymentRequest::new(&context(), PaymentMethod::Mpesa, Some("+243 812 345 678")).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn successful_payment_reports_reference_and_fixed_message() {
        let mut api = MockPaymentApi::new();
        api.expect_create_payment()
            .times(1)
            .returning(|_| Ok(record(Some("TX-42"), PaymentStatus::EnAttente)));
        api.expect_confirm_payment()
            .times(1)
            .withf(|id, ack| id == "pay-1" && ack.transaction_id == "TX-42")
            .returning(|_, _| Ok(record(Some("TX-42"), PaymentStatus::Succes)));

        let successes = Cell::new(0);
        let errors = Cell::new(0);
        let flow = PaymentFlow::new(api);
        let started = tokio::time::Instant::now();

        let result = flow
            .submit_payment(
                &mpesa_request(),
                |_| successes.set(successes.get() + 1),
                |_| errors.set(errors.get() + 1),
            )
            .await;

        assert!(result.succeeded());
        assert_eq!(result.message(), PAYMENT_SUCCESS_MESSAGE);
        assert_eq!(result.transaction_reference(), Some("TX-42"));
        assert_eq!((successes.get(), errors.get()), (1, 0));
        assert!(started.elapsed() >= PROCESSING_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_reference_is_synthesized() {
        let mut api = MockPaymentApi::new();
        api.expect_create_payment()
            .returning(|_| Ok(record(None, PaymentStatus::EnAttente)));
        api.expect_confirm_payment()
            .withf(|_, ack| ack.transaction_id.starts_with("SIM-"))
            .returning(|_, _| Ok(record(None, PaymentStatus::Succes)));

        let result = PaymentFlow::new(api)
            .submit_payment(&mpesa_request(), |_| {}, |_| {})
            .await;

        let reference = result.transaction_reference().expect("reference");
        assert!(reference.starts_with("SIM-"));
        assert!(reference.len() > "SIM-".len());
    }

    #[tokio::test(start_paused = true)]
    async fn create_failure_never_confirms() {
        let mut api = MockPaymentApi::new();
        api.expect_create_payment().times(1).returning(|_| {
            Err(RemoteError::Status {
                status: 400,
                message: Some("Montant invalide".to_string()),
            })
        });
        api.expect_confirm_payment().never();

        let successes = Cell::new(0);
        let errors = Cell::new(0);
        let result = PaymentFlow::new(api)
            .submit_payment(
                &mpesa_request(),
                |_| successes.set(successes.get() + 1),
                |_| errors.set(errors.get() + 1),
            )
            .await;

        assert!(!result.succeeded());
        assert_eq!(result.message(), "Montant invalide");
        assert_eq!((successes.get(), errors.get()), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_failure_without_message_uses_fallback() {
        let mut api = MockPaymentApi::new();
        api.expect_create_payment()
            .returning(|_| Ok(record(Some("TX-1"), PaymentStatus::EnAttente)));
        api.expect_confirm_payment()
            .times(1)
            .returning(|_, _| Err(RemoteError::Transport("reset".to_string())));

        let errors = Cell::new(0);
        let result = PaymentFlow::new(api)
            .submit_payment(&mpesa_request(), |_| {}, |_| errors.set(errors.get() + 1))
            .await;

        assert!(!result.succeeded());
        assert_eq!(result.message(), PAYMENT_FAILURE_MESSAGE);
        assert_eq!(errors.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn run_moves_selector_to_result() {
        let mut api = MockPaymentApi::new();
        api.expect_create_payment()
            .withf(|request| request.method() == PaymentMethod::CashOnDelivery)
            .returning(|_| Ok(record(Some("TX-9"), PaymentStatus::EnAttente)));
        api.expect_confirm_payment()
            .returning(|_, _| Ok(record(Some("TX-9"), PaymentStatus::Succes)));

        let mut selector = PaymentSelector::new();
        selector.choose(PaymentMethod::CashOnDelivery).unwrap();

        let result = PaymentFlow::new(api)
            .run(&mut selector, &context(), |_| {}, |_| {})
            .await
            .unwrap();

        assert!(result.succeeded());
        assert_eq!(selector.step(), &PaymentStep::Result(result));
    }

    #[tokio::test(start_paused = true)]
    async fn run_rejects_incomplete_details_before_network() {
        let mut api = MockPaymentApi::new();
        api.expect_create_payment().never();

        let mut selector = PaymentSelector::new();
        selector.choose(PaymentMethod::AirtelMoney).unwrap();

        let err = PaymentFlow::new(api)
            .run(&mut selector, &context(), |_| {}, |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingPhoneNumber);
    }

    #[tokio::test]
    async fn order_payments_reports_paid_flag() {
        let mut api = MockPaymentApi::new();
        api.expect_payments_for_order()
            .withf(|order_id| order_id == "o-1")
            .returning(|_| Ok(vec![record(Some("TX-1"), PaymentStatus::Succes)]));
        api.expect_is_order_paid().returning(|_| Ok(true));

        let payments = PaymentFlow::new(api).order_payments("o-1").await.unwrap();
        assert!(payments.paid);
        assert_eq!(payments.records.len(), 1);
    }

    #[tokio::test]
    async fn abandon_fails_pending_payment_only() {
        let mut api = MockPaymentApi::new();
        api.expect_get_payment()
            .times(1)
            .returning(|_| Ok(record(None, PaymentStatus::EnAttente)));
        api.expect_fail_payment()
            .times(1)
            .withf(|id, reason| id == "pay-1" && reason == "Client absent")
            .returning(|_, _| Ok(record(None, PaymentStatus::Echoue)));

        let failed = PaymentFlow::new(api)
            .abandon("pay-1", " Client absent ")
            .await
            .unwrap();
        assert_eq!(failed.status, Some(PaymentStatus::Echoue));

        let mut api = MockPaymentApi::new();
        api.expect_get_payment()
            .returning(|_| Ok(record(Some("TX-1"), PaymentStatus::Succes)));
        api.expect_fail_payment().never();
        let err = PaymentFlow::new(api).abandon("pay-1", "late").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_payment_is_not_found() {
        let mut api = MockPaymentApi::new();
        api.expect_get_payment().returning(|_| {
            Err(RemoteError::Status {
                status: 404,
                message: None,
            })
        });
        let err = PaymentFlow::new(api).payment("nope").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }
}
