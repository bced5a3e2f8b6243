use std::sync::Arc;

use chrono::Utc;

use printworks_core::{DomainError, DomainResult, InvoiceId, OrderId, UserId};
use printworks_orders::{
    derived_design_ref, derived_fabric_label, Catalog, Order, OrderStatus, PlaceOrder, UserDirectory,
};
use printworks_production::{BillingStatus, NewRun, ProductionRun};

use crate::error::{ServiceError, ServiceResult};
use crate::services::customers::CustomerDirectory;
use crate::services::ledger::ProductionLedger;
use crate::services::notifier::OrderNotifier;
use crate::store::Collection;

/// Machine label for runs derived from web-shop orders.
pub const WEB_ORDER_MACHINE: &str = "Web";

/// Checkout, repeat orders, and the production run every order produces.
pub struct OrderEngine {
    orders: Arc<dyn Collection<Order>>,
    ledger: Arc<ProductionLedger>,
    customers: Arc<CustomerDirectory>,
    catalog: Arc<dyn Catalog>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn OrderNotifier>,
}

impl OrderEngine {
    pub fn new(
        orders: Arc<dyn Collection<Order>>,
        ledger: Arc<ProductionLedger>,
        customers: Arc<CustomerDirectory>,
        catalog: Arc<dyn Catalog>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            orders,
            ledger,
            customers,
            catalog,
            users,
            notifier,
        }
    }

    /// Price, classify, and store an order, then derive its production run.
    ///
    /// With a caller-supplied id that already exists, the stored order is returned
    /// unchanged; the run derivation still runs and dedupes. An id already taken by
    /// another user is a conflict. The lookup and the insert happen under one
    /// collection write, so concurrent retries store the order once.
    ///
    /// If the run cannot be derived for a new order, the order is removed again
    /// and the error is returned.
    pub fn place_order(&self, cmd: PlaceOrder) -> ServiceResult<Order> {
        let id = cmd.order_id.unwrap_or_default();
        let user_id = cmd.user_id;
        let mut cmd = Some(cmd);
        let mut outcome: Option<DomainResult<(Order, bool)>> = None;

        self.orders.modify(&mut |orders| {
            if let Some(existing) = orders.iter().find(|o| o.id == id) {
                outcome = Some(if existing.user_id == user_id {
                    Ok((existing.clone(), false))
                } else {
                    Err(DomainError::conflict("order id is already in use"))
                });
                return false;
            }
            let Some(cmd) = cmd.take() else {
                return false;
            };
            match Order::place(id, InvoiceId::new(), cmd, self.catalog.as_ref(), Utc::now()) {
                Ok(order) => {
                    orders.push(order.clone());
                    outcome = Some(Ok((order, true)));
                    true
                }
                Err(e) => {
                    outcome = Some(Err(e));
                    false
                }
            }
        })?;

        let (order, placed) = match outcome.ok_or_else(ServiceError::not_found)? {
            Ok(found) => found,
            Err(e) => {
                if matches!(e, DomainError::Conflict(_)) {
                    tracing::warn!(order_id = %id, "order id already used by another user");
                }
                return Err(e.into());
            }
        };

        if !placed {
            tracing::info!(order_id = %order.id, "order already placed; returning stored order");
            self.record_run(&order)?;
            return Ok(order);
        }

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            customer_type = ?order.customer_type,
            payment_method = ?order.payment_method,
            status = ?order.status,
            total = %order.total,
            "order placed"
        );

        if let Err(e) = self.record_run(&order) {
            tracing::warn!(order_id = %order.id, error = %e, "deriving run failed; removing order");
            self.orders.remove(&order.id)?;
            return Err(e);
        }
        self.notify(&order);
        Ok(order)
    }

    /// Place a copy of a prior order's lines as repeat designs.
    ///
    /// `None` when the order is missing, belongs to another user, or has no lines.
    pub fn repeat_order(&self, order_id: OrderId, user_id: UserId) -> ServiceResult<Option<Order>> {
        let Some(prior) = self.orders.get(&order_id)? else {
            return Ok(None);
        };
        let Some(request) = prior.repeat_request(user_id) else {
            tracing::debug!(order_id = %order_id, user_id = %user_id, "order cannot be repeated by this user");
            return Ok(None);
        };
        self.place_order(request).map(Some)
    }

    /// Operator status change. `None` when the order does not exist.
    pub fn update_status(&self, order_id: OrderId, status: OrderStatus) -> ServiceResult<Option<Order>> {
        let mut outcome = None;
        self.orders.modify(&mut |orders| {
            let Some(order) = orders.iter_mut().find(|o| o.id == order_id) else {
                return false;
            };
            let result = order.update_status(status, Utc::now()).map(|changed| (order.clone(), changed));
            let changed = matches!(result, Ok((_, true)));
            outcome = Some(result);
            changed
        })?;

        match outcome {
            Some(Ok((order, changed))) => {
                if changed {
                    tracing::info!(order_id = %order_id, status = ?status, "order status changed");
                }
                Ok(Some(order))
            }
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    pub fn get(&self, order_id: OrderId) -> ServiceResult<Option<Order>> {
        Ok(self.orders.get(&order_id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<Order>> {
        Ok(self.orders.snapshot()?)
    }

    pub fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<Order>> {
        Ok(self
            .orders
            .snapshot()?
            .into_iter()
            .filter(|o| o.user_id == user_id)
            .collect())
    }

    fn record_run(&self, order: &Order) -> ServiceResult<ProductionRun> {
        let web_orders = self.customers.ensure_web_orders_customer()?;
        let input = NewRun {
            date: order.created_at.date_naive(),
            machine: WEB_ORDER_MACHINE.to_string(),
            customer_id: web_orders.id,
            design_ref: derived_design_ref(order, self.catalog.as_ref()),
            fabric: derived_fabric_label(order, self.catalog.as_ref()),
            meters: order.total_quantity(),
            notes: order.notes.clone(),
            source_order_id: Some(order.id),
            status: Some(BillingStatus::Draft),
        };
        let (run, _created) = self.ledger.upsert_from_order(order.id, input)?;
        Ok(run)
    }

    fn notify(&self, order: &Order) {
        let contact = self.users.user(order.user_id);
        if contact.is_none() {
            tracing::warn!(order_id = %order.id, user_id = %order.user_id, "no contact for order owner");
        }
        if let Err(e) = self.notifier.order_placed(order, contact.as_ref()) {
            tracing::error!(order_id = %order.id, error = %e, "order notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifier::{NotifyError, TracingNotifier};
    use crate::store::{StoreError, Stores};
    use printworks_customers::WEB_ORDERS_CUSTOMER_ID;
    use printworks_orders::{
        CustomerType, DesignChoice, FabricChoice, FabricSource, FabricType, InMemoryCatalog,
        InMemoryUserDirectory, OrderItemRequest, PaymentMethod, StubStatus, UserContact,
    };
    use rust_decimal::Decimal;
    use std::sync::{Barrier, Mutex};

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(OrderId, Option<String>)>>,
    }

    impl OrderNotifier for RecordingNotifier {
        fn order_placed(&self, order: &Order, contact: Option<&UserContact>) -> Result<(), NotifyError> {
            self.seen
                .lock()
                .unwrap()
                .push((order.id, contact.map(|c| c.email.clone())));
            Ok(())
        }
    }

    struct FailingNotifier;

    impl OrderNotifier for FailingNotifier {
        fn order_placed(&self, _order: &Order, _contact: Option<&UserContact>) -> Result<(), NotifyError> {
            Err(NotifyError("smtp down".to_string()))
        }
    }

    /// Run store whose writes always fail.
    struct RejectingRuns;

    impl Collection<ProductionRun> for RejectingRuns {
        fn name(&self) -> &str {
            "production_runs"
        }

        fn snapshot(&self) -> Result<Vec<ProductionRun>, StoreError> {
            Ok(Vec::new())
        }

        fn modify(&self, _apply: &mut dyn FnMut(&mut Vec<ProductionRun>) -> bool) -> Result<(), StoreError> {
            Err(StoreError::LockPoisoned(self.name().to_string()))
        }
    }

    fn engine_with(stores: &Stores, notifier: Arc<dyn OrderNotifier>, users: InMemoryUserDirectory) -> OrderEngine {
        let customers = Arc::new(CustomerDirectory::new(
            stores.customers.clone(),
            stores.pricing_rules.clone(),
            stores.runs.clone(),
            stores.invoices.clone(),
        ));
        let ledger = Arc::new(ProductionLedger::new(stores.runs.clone(), stores.customers.clone()));
        let catalog = InMemoryCatalog::new().with_preset("p-1", "Paisley", Decimal::from(90));
        OrderEngine::new(
            stores.orders.clone(),
            ledger,
            customers,
            Arc::new(catalog),
            Arc::new(users),
            notifier,
        )
    }

    fn engine(stores: &Stores) -> OrderEngine {
        engine_with(stores, Arc::new(TracingNotifier), InMemoryUserDirectory::new())
    }

    fn checkout(user_id: UserId, customer_type: CustomerType, payment_method: PaymentMethod) -> PlaceOrder {
        PlaceOrder {
            order_id: None,
            user_id,
            customer_type,
            payment_method,
            payment_proof: None,
            items: vec![
                OrderItemRequest {
                    design: DesignChoice::Preset {
                        preset_id: "p-1".to_string(),
                    },
                    fabric: FabricChoice {
                        fabric_type: FabricType::Natural,
                        source: FabricSource::Factory,
                        factory_fabric_id: None,
                    },
                    quantity: Decimal::from(3),
                },
                OrderItemRequest {
                    design: DesignChoice::Uploaded {
                        file_ref: "upload-1".to_string(),
                    },
                    fabric: FabricChoice {
                        fabric_type: FabricType::Synthetic,
                        source: FabricSource::Customer,
                        factory_fabric_id: None,
                    },
                    quantity: Decimal::from(2),
                },
            ],
            notes: "rush".to_string(),
            repeat_of: None,
        }
    }

    #[test]
    fn new_cod_order_is_paid_and_derives_one_run() {
        let stores = Stores::in_memory();
        let engine = engine(&stores);

        let order = engine
            .place_order(checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod))
            .unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        let stub = order.invoice.as_ref().unwrap();
        assert_eq!(stub.status, StubStatus::Issued);
        assert!(stub.issued_at.is_some());
        // (90 + 80) * 3 + 150 * 2
        assert_eq!(order.total, Decimal::from(810));

        let runs = stores.runs.snapshot().unwrap();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.customer_id, WEB_ORDERS_CUSTOMER_ID);
        assert_eq!(run.meters, Decimal::from(5));
        assert_eq!(run.design_ref, "Paisley");
        assert_eq!(run.fabric, "Natural fabric (factory)");
        assert_eq!(run.billing_status, BillingStatus::Draft);
        assert_eq!(run.notes, "rush");
        assert_eq!(run.source_order_id, Some(order.id));
    }

    #[test]
    fn existing_customer_bank_transfer_is_invoice_pending() {
        let engine = engine(&Stores::in_memory());
        let order = engine
            .place_order(checkout(UserId::new(), CustomerType::Existing, PaymentMethod::BankTransfer))
            .unwrap();

        assert_eq!(order.status, OrderStatus::InvoicePending);
        let stub = order.invoice.unwrap();
        assert_eq!(stub.status, StubStatus::Pending);
        assert!(stub.issued_at.is_none());
    }

    #[test]
    fn retry_with_same_order_id_is_idempotent() {
        let stores = Stores::in_memory();
        let engine = engine(&stores);
        let mut cmd = checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod);
        cmd.order_id = Some(OrderId::new());

        let first = engine.place_order(cmd.clone()).unwrap();
        let second = engine.place_order(cmd).unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.list().unwrap().len(), 1);
        assert_eq!(stores.runs.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn concurrent_retries_store_one_order() {
        const THREADS: usize = 8;

        for _ in 0..50 {
            let stores = Stores::in_memory();
            let engine = engine(&stores);
            let mut cmd = checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod);
            cmd.order_id = Some(OrderId::new());
            let barrier = Barrier::new(THREADS);

            let placed: Vec<Order> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        s.spawn(|| {
                            barrier.wait();
                            engine.place_order(cmd.clone()).unwrap()
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert!(placed.iter().all(|o| *o == placed[0]));
            assert_eq!(engine.list().unwrap().len(), 1);
            assert_eq!(stores.runs.snapshot().unwrap().len(), 1);
        }
    }

    #[test]
    fn failed_run_derivation_removes_new_order() {
        let stores = Stores {
            runs: Arc::new(RejectingRuns),
            ..Stores::in_memory()
        };
        let engine = engine(&stores);
        let mut cmd = checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod);
        cmd.order_id = Some(OrderId::new());

        let err = engine.place_order(cmd).unwrap_err();

        assert!(matches!(err, ServiceError::Store(StoreError::LockPoisoned(_))));
        assert!(engine.list().unwrap().is_empty());
    }

    #[test]
    fn order_id_of_another_user_is_a_conflict() {
        let stores = Stores::in_memory();
        let engine = engine(&stores);
        let owner = UserId::new();
        let mut cmd = checkout(owner, CustomerType::New, PaymentMethod::Cod);
        cmd.order_id = Some(OrderId::new());
        let first = engine.place_order(cmd.clone()).unwrap();

        cmd.user_id = UserId::new();
        let err = engine.place_order(cmd).unwrap_err();

        assert!(matches!(err.domain(), Some(DomainError::Conflict(_))));
        assert_eq!(engine.get(first.id).unwrap().unwrap().user_id, owner);
        assert_eq!(stores.runs.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn repeat_order_links_prior_and_checks_owner() {
        let stores = Stores::in_memory();
        let engine = engine(&stores);
        let owner = UserId::new();
        let prior = engine
            .place_order(checkout(owner, CustomerType::Existing, PaymentMethod::Cod))
            .unwrap();

        assert!(engine.repeat_order(prior.id, UserId::new()).unwrap().is_none());
        assert!(engine.repeat_order(OrderId::new(), owner).unwrap().is_none());

        let repeat = engine.repeat_order(prior.id, owner).unwrap().unwrap();
        assert_eq!(repeat.repeat_of, Some(prior.id));
        assert_eq!(repeat.notes, prior.notes);
        assert!(repeat
            .items
            .iter()
            .all(|i| matches!(i.design, DesignChoice::Repeat { original_order_id, .. } if original_order_id == prior.id)));

        let runs = stores.runs.snapshot().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].design_ref, "Paisley");
        assert_eq!(runs[1].source_order_id, Some(repeat.id));
        assert_eq!(engine.list_for_user(owner).unwrap().len(), 2);
    }

    #[test]
    fn status_updates_stop_at_terminal_states() {
        let stores = Stores::in_memory();
        let engine = engine(&stores);
        let order = engine
            .place_order(checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod))
            .unwrap();

        let done = engine.update_status(order.id, OrderStatus::Completed).unwrap().unwrap();
        assert_eq!(done.status, OrderStatus::Completed);

        let err = engine.update_status(order.id, OrderStatus::Cancelled).unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::InvariantViolation(_))));
        assert!(engine.update_status(OrderId::new(), OrderStatus::Paid).unwrap().is_none());
        assert_eq!(stores.runs.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn notifier_receives_resolved_contact() {
        let stores = Stores::in_memory();
        let user = UserId::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let users = InMemoryUserDirectory::new().with_user(user, "Amal", "amal@example.com");
        let engine = engine_with(&stores, notifier.clone(), users);

        let order = engine
            .place_order(checkout(user, CustomerType::New, PaymentMethod::Cod))
            .unwrap();

        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[(order.id, Some("amal@example.com".to_string()))]);
    }

    #[test]
    fn notification_failure_does_not_fail_checkout() {
        let stores = Stores::in_memory();
        let engine = engine_with(&stores, Arc::new(FailingNotifier), InMemoryUserDirectory::new());

        let order = engine.place_order(checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod));
        assert!(order.is_ok());
        assert_eq!(engine.list().unwrap().len(), 1);
    }

    #[test]
    fn order_without_items_is_rejected_and_creates_no_run() {
        let stores = Stores::in_memory();
        let engine = engine(&stores);
        let mut cmd = checkout(UserId::new(), CustomerType::New, PaymentMethod::Cod);
        cmd.items.clear();

        let err = engine.place_order(cmd).unwrap_err();
        assert!(matches!(err.domain(), Some(DomainError::Validation(_))));
        assert!(stores.runs.snapshot().unwrap().is_empty());
    }
}
