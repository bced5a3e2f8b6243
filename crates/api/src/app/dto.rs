use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{CustomerId, RunId, UserId};
use printworks_invoicing::InvoiceStatus;
use printworks_orders::OrderStatus;
use printworks_production::{BillingStatus, ImportOptions, ImportRow};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CustomerListQuery {
    /// Match by display name or alias instead of listing everyone.
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddRuleRequest {
    pub fabric: Option<String>,
    pub design: Option<String>,
    pub price_per_meter: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    #[serde(default)]
    pub fabric: String,
    #[serde(default)]
    pub design: String,
}

#[derive(Debug, Deserialize)]
pub struct RunListQuery {
    pub status: Option<BillingStatus>,
    pub customer: Option<CustomerId>,
}

#[derive(Debug, Deserialize)]
pub struct ClearRunsQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRunsRequest {
    pub ids: Vec<RunId>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRunsRequest {
    pub rows: Vec<ImportRow>,
    pub options: ImportOptions,
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub user: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct RepeatOrderRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceListQuery {
    pub customer: Option<CustomerId>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for ItemsResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Serialize)]
pub struct ApproveRunsResponse {
    pub approved: Vec<RunId>,
}

#[derive(Debug, Serialize)]
pub struct MeterTotalsResponse {
    pub customer_id: CustomerId,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub total_meters: Decimal,
    pub invoiced_meters: Decimal,
}
