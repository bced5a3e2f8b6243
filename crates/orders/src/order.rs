use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{DomainError, DomainResult, Entity, InvoiceId, OrderId, UserId};

use crate::catalog::Catalog;
use crate::pricing::unit_price;

/// Customer classification supplied at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerType {
    New,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    BankTransfer,
}

/// Order status lifecycle.
///
/// The first four are assigned at creation; `Completed` and `Cancelled` are set
/// by operators later and are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Paid,
    PaymentPending,
    Invoiced,
    InvoicePending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Status of the invoice stub embedded in an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StubStatus {
    Pending,
    Issued,
}

/// Lightweight invoice carried by an order (distinct from factory invoice documents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceStub {
    pub id: InvoiceId,
    pub amount: Decimal,
    pub issued_at: Option<DateTime<Utc>>,
    pub status: StubStatus,
}

/// Where the printed design comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DesignChoice {
    Preset { preset_id: String },
    Uploaded { file_ref: String },
    Library { design_id: String },
    /// Reprint of a line from an earlier order, priced at the repeat tier.
    Repeat {
        original_order_id: OrderId,
        /// The design printed the first time; `None` when the client did not send it.
        #[serde(default)]
        design: Option<Box<DesignChoice>>,
    },
}

impl DesignChoice {
    /// The design actually printed, looking through repeat links.
    pub fn printed(&self) -> Option<&DesignChoice> {
        match self {
            DesignChoice::Repeat { design, .. } => design.as_deref().and_then(DesignChoice::printed),
            other => Some(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricType {
    Natural,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricSource {
    /// Fabric supplied by the factory (surcharged).
    Factory,
    /// Fabric brought in by the customer.
    Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FabricChoice {
    pub fabric_type: FabricType,
    pub source: FabricSource,
    #[serde(default)]
    pub factory_fabric_id: Option<String>,
}

/// Requested order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub design: DesignChoice,
    pub fabric: FabricChoice,
    /// Meters to print.
    pub quantity: Decimal,
}

/// Priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub line_no: u32,
    pub design: DesignChoice,
    pub fabric: FabricChoice,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// Checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    /// Caller-supplied id for idempotent retries; generated when absent.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub user_id: UserId,
    pub customer_type: CustomerType,
    pub payment_method: PaymentMethod,
    /// Reference to an uploaded bank-transfer receipt.
    #[serde(default)]
    pub payment_proof: Option<String>,
    pub items: Vec<OrderItemRequest>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub repeat_of: Option<OrderId>,
}

/// Customer-facing purchase request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub customer_type: CustomerType,
    pub payment_method: PaymentMethod,
    pub payment_proof: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub invoice: Option<InvoiceStub>,
    #[serde(default)]
    pub notes: String,
    pub repeat_of: Option<OrderId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Creation-time status decision table.
///
/// | customer | payment                 | order            | stub    |
/// |----------|-------------------------|------------------|---------|
/// | new      | COD                     | PAID             | ISSUED  |
/// | new      | bank transfer, proof    | PAYMENT_PENDING  | ISSUED  |
/// | new      | bank transfer, no proof | INVOICED         | ISSUED  |
/// | existing | any                     | INVOICE_PENDING  | PENDING |
pub fn initial_statuses(
    customer_type: CustomerType,
    payment_method: PaymentMethod,
    has_payment_proof: bool,
) -> (OrderStatus, StubStatus) {
    match (customer_type, payment_method) {
        (CustomerType::Existing, _) => (OrderStatus::InvoicePending, StubStatus::Pending),
        (CustomerType::New, PaymentMethod::Cod) => (OrderStatus::Paid, StubStatus::Issued),
        (CustomerType::New, PaymentMethod::BankTransfer) if has_payment_proof => {
            (OrderStatus::PaymentPending, StubStatus::Issued)
        }
        (CustomerType::New, PaymentMethod::BankTransfer) => (OrderStatus::Invoiced, StubStatus::Issued),
    }
}

impl Order {
    /// Price and classify a checkout request.
    pub fn place(
        id: OrderId,
        invoice_id: InvoiceId,
        cmd: PlaceOrder,
        catalog: &dyn Catalog,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if cmd.items.is_empty() {
            return Err(DomainError::validation("cannot place order without items"));
        }

        let too_large = || DomainError::validation("order amount is too large");
        let mut items = Vec::with_capacity(cmd.items.len());
        let mut total = Decimal::ZERO;
        let mut meters = Decimal::ZERO;
        for (idx, req) in cmd.items.into_iter().enumerate() {
            if req.quantity <= Decimal::ZERO {
                return Err(DomainError::validation("quantity must be positive"));
            }
            let unit = unit_price(&req.design, &req.fabric, catalog)?;
            let line_total = unit.checked_mul(req.quantity).ok_or_else(too_large)?;
            total = total.checked_add(line_total).ok_or_else(too_large)?;
            meters = meters.checked_add(req.quantity).ok_or_else(too_large)?;
            items.push(OrderItem {
                line_no: (idx as u32) + 1,
                line_total,
                unit_price: unit,
                design: req.design,
                fabric: req.fabric,
                quantity: req.quantity,
            });
        }

        let payment_proof = cmd
            .payment_proof
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        let (status, stub_status) =
            initial_statuses(cmd.customer_type, cmd.payment_method, payment_proof.is_some());

        Ok(Self {
            id,
            user_id: cmd.user_id,
            customer_type: cmd.customer_type,
            payment_method: cmd.payment_method,
            payment_proof,
            items,
            total,
            status,
            invoice: Some(InvoiceStub {
                id: invoice_id,
                amount: total,
                issued_at: (stub_status == StubStatus::Issued).then_some(now),
                status: stub_status,
            }),
            notes: cmd.notes,
            repeat_of: cmd.repeat_of,
            created_at: now,
            updated_at: now,
        })
    }

    /// Operator-driven status change. Returns whether the status changed.
    pub fn update_status(&mut self, status: OrderStatus, now: DateTime<Utc>) -> DomainResult<bool> {
        if self.status == status {
            return Ok(false);
        }
        if self.status.is_terminal() {
            return Err(DomainError::invariant(
                "cannot change status of a completed or cancelled order",
            ));
        }
        self.status = status;
        self.updated_at = now;
        Ok(true)
    }

    /// Total printed meters across all lines.
    pub fn total_quantity(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Checkout request that repeats this order for `user_id`.
    ///
    /// `None` when the order belongs to someone else or has no lines.
    pub fn repeat_request(&self, user_id: UserId) -> Option<PlaceOrder> {
        if self.user_id != user_id || self.items.is_empty() {
            return None;
        }

        let items = self
            .items
            .iter()
            .map(|item| OrderItemRequest {
                design: DesignChoice::Repeat {
                    original_order_id: self.id,
                    design: item.design.printed().cloned().map(Box::new),
                },
                fabric: item.fabric.clone(),
                quantity: item.quantity,
            })
            .collect();

        Some(PlaceOrder {
            order_id: None,
            user_id,
            customer_type: self.customer_type,
            payment_method: self.payment_method,
            payment_proof: None,
            items,
            notes: self.notes.clone(),
            repeat_of: Some(self.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::pricing::{DEFAULT_TIER, NATURAL_SURCHARGE, UPLOAD_TIER};

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn customer_fabric() -> FabricChoice {
        FabricChoice {
            fabric_type: FabricType::Synthetic,
            source: FabricSource::Customer,
            factory_fabric_id: None,
        }
    }

    fn request(customer_type: CustomerType, payment_method: PaymentMethod, proof: Option<&str>) -> PlaceOrder {
        PlaceOrder {
            order_id: None,
            user_id: UserId::new(),
            customer_type,
            payment_method,
            payment_proof: proof.map(str::to_string),
            items: vec![OrderItemRequest {
                design: DesignChoice::Uploaded {
                    file_ref: "uploads/a.png".to_string(),
                },
                fabric: customer_fabric(),
                quantity: Decimal::from(4),
            }],
            notes: "rush".to_string(),
            repeat_of: None,
        }
    }

    fn place(cmd: PlaceOrder) -> DomainResult<Order> {
        Order::place(OrderId::new(), InvoiceId::new(), cmd, &InMemoryCatalog::new(), test_time())
    }

    #[test]
    fn decision_table_covers_every_branch() {
        use CustomerType::*;
        use PaymentMethod::*;

        assert_eq!(initial_statuses(New, Cod, false), (OrderStatus::Paid, StubStatus::Issued));
        assert_eq!(
            initial_statuses(New, BankTransfer, true),
            (OrderStatus::PaymentPending, StubStatus::Issued)
        );
        assert_eq!(
            initial_statuses(New, BankTransfer, false),
            (OrderStatus::Invoiced, StubStatus::Issued)
        );
        for method in [Cod, BankTransfer] {
            for proof in [true, false] {
                assert_eq!(
                    initial_statuses(Existing, method, proof),
                    (OrderStatus::InvoicePending, StubStatus::Pending)
                );
            }
        }
    }

    #[test]
    fn new_customer_cod_order_is_paid_with_issued_stub() {
        let order = place(request(CustomerType::New, PaymentMethod::Cod, None)).unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        let stub = order.invoice.as_ref().unwrap();
        assert_eq!(stub.status, StubStatus::Issued);
        assert!(stub.issued_at.is_some());
        assert_eq!(stub.amount, order.total);
    }

    #[test]
    fn existing_customer_bank_transfer_is_invoice_pending() {
        let order = place(request(CustomerType::Existing, PaymentMethod::BankTransfer, Some("r.pdf"))).unwrap();
        assert_eq!(order.status, OrderStatus::InvoicePending);
        let stub = order.invoice.as_ref().unwrap();
        assert_eq!(stub.status, StubStatus::Pending);
        assert_eq!(stub.issued_at, None);
    }

    #[test]
    fn blank_payment_proof_counts_as_missing() {
        let order = place(request(CustomerType::New, PaymentMethod::BankTransfer, Some("   "))).unwrap();
        assert_eq!(order.status, OrderStatus::Invoiced);
        assert_eq!(order.payment_proof, None);
    }

    #[test]
    fn totals_are_unit_price_times_quantity() {
        let mut cmd = request(CustomerType::New, PaymentMethod::Cod, None);
        cmd.items.push(OrderItemRequest {
            design: DesignChoice::Library {
                design_id: "d-1".to_string(),
            },
            fabric: FabricChoice {
                fabric_type: FabricType::Natural,
                source: FabricSource::Factory,
                factory_fabric_id: None,
            },
            quantity: Decimal::from(2),
        });

        let order = place(cmd).unwrap();
        assert_eq!(order.items[0].unit_price, UPLOAD_TIER);
        assert_eq!(order.items[0].line_total, UPLOAD_TIER * Decimal::from(4));
        assert_eq!(order.items[1].line_no, 2);
        assert_eq!(order.items[1].unit_price, DEFAULT_TIER + NATURAL_SURCHARGE);
        assert_eq!(
            order.total,
            UPLOAD_TIER * Decimal::from(4) + (DEFAULT_TIER + NATURAL_SURCHARGE) * Decimal::from(2)
        );
        assert_eq!(order.total_quantity(), Decimal::from(6));
    }

    #[test]
    fn place_rejects_empty_orders_and_bad_quantities() {
        let mut cmd = request(CustomerType::New, PaymentMethod::Cod, None);
        cmd.items.clear();
        assert!(matches!(place(cmd).unwrap_err(), DomainError::Validation(_)));

        let mut cmd = request(CustomerType::New, PaymentMethod::Cod, None);
        cmd.items[0].quantity = Decimal::ZERO;
        match place(cmd).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("quantity must be positive") => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }

    #[test]
    fn oversized_quantity_is_rejected_instead_of_overflowing() {
        let mut cmd = request(CustomerType::New, PaymentMethod::Cod, None);
        cmd.items[0].quantity = Decimal::MAX;
        match place(cmd).unwrap_err() {
            DomainError::Validation(msg) if msg.contains("too large") => {}
            other => panic!("Expected Validation error for huge quantity, got {other:?}"),
        }
    }

    #[test]
    fn terminal_orders_reject_status_changes() {
        let mut order = place(request(CustomerType::Existing, PaymentMethod::Cod, None)).unwrap();
        assert!(order.update_status(OrderStatus::Paid, test_time()).unwrap());
        assert!(!order.update_status(OrderStatus::Paid, test_time()).unwrap());
        assert!(order.update_status(OrderStatus::Completed, test_time()).unwrap());

        let err = order.update_status(OrderStatus::Paid, test_time()).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("completed or cancelled") => {}
            _ => panic!("Expected InvariantViolation for changing completed order"),
        }
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[test]
    fn repeat_request_links_original_and_checks_owner() {
        let order = place(request(CustomerType::New, PaymentMethod::Cod, None)).unwrap();

        assert!(order.repeat_request(UserId::new()).is_none());

        let repeat = order.repeat_request(order.user_id).unwrap();
        assert_eq!(repeat.repeat_of, Some(order.id));
        assert_eq!(repeat.notes, "rush");
        assert_eq!(repeat.items.len(), 1);
        assert_eq!(repeat.items[0].quantity, Decimal::from(4));
        assert_eq!(repeat.items[0].fabric, order.items[0].fabric);
        assert_eq!(
            repeat.items[0].design,
            DesignChoice::Repeat {
                original_order_id: order.id,
                design: Some(Box::new(order.items[0].design.clone())),
            }
        );
    }

    #[test]
    fn repeating_a_repeat_keeps_the_first_design() {
        let mut cmd = request(CustomerType::New, PaymentMethod::Cod, None);
        cmd.items[0].design = DesignChoice::Preset {
            preset_id: "p-1".to_string(),
        };
        let first = place(cmd).unwrap();
        let second = place(first.repeat_request(first.user_id).unwrap()).unwrap();
        let third = second.repeat_request(second.user_id).unwrap();

        assert_eq!(third.repeat_of, Some(second.id));
        match &third.items[0].design {
            DesignChoice::Repeat {
                original_order_id,
                design,
            } => {
                assert_eq!(*original_order_id, second.id);
                assert_eq!(
                    design.as_deref(),
                    Some(&DesignChoice::Preset {
                        preset_id: "p-1".to_string()
                    })
                );
            }
            other => panic!("expected a repeat design, got {other:?}"),
        }
    }

    #[test]
    fn repeat_design_without_original_still_deserializes() {
        let original = OrderId::new();
        let json = format!(r#"{{"source":"repeat","original_order_id":"{original}"}}"#);
        let design: DesignChoice = serde_json::from_str(&json).unwrap();
        assert_eq!(
            design,
            DesignChoice::Repeat {
                original_order_id: original,
                design: None,
            }
        );
        assert_eq!(design.printed(), None);
    }
}
