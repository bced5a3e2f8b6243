use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use printworks_core::{CustomerId, PricingRuleId};
use printworks_customers::CustomerEntity;
use printworks_pricing::{resolve_price, NewPricingRule, PriceResolution, PricingRule};

use crate::error::{ServiceError, ServiceResult};
use crate::store::Collection;

/// Per-customer price rules and price lookups.
pub struct PricingResolver {
    rules: Arc<dyn Collection<PricingRule>>,
    customers: Arc<dyn Collection<CustomerEntity>>,
}

impl PricingResolver {
    pub fn new(rules: Arc<dyn Collection<PricingRule>>, customers: Arc<dyn Collection<CustomerEntity>>) -> Self {
        Self { rules, customers }
    }

    /// Add a rule for an existing customer.
    pub fn add_rule(&self, input: NewPricingRule) -> ServiceResult<PricingRule> {
        if self.customers.get(&input.customer_id)?.is_none() {
            return Err(ServiceError::not_found());
        }
        let rule = PricingRule::create(PricingRuleId::new(), input, Utc::now())?;
        self.rules.insert(rule.clone())?;
        tracing::info!(
            rule_id = %rule.id,
            customer_id = %rule.customer_id,
            fabric = ?rule.fabric,
            design = ?rule.design,
            price_per_meter = %rule.price_per_meter,
            "pricing rule added"
        );
        Ok(rule)
    }

    /// Remove one of `customer_id`'s rules. A rule owned by another customer is
    /// treated as missing.
    pub fn remove_rule(&self, customer_id: CustomerId, id: PricingRuleId) -> ServiceResult<bool> {
        let mut removed = false;
        self.rules.modify(&mut |rules| {
            let before = rules.len();
            rules.retain(|r| !(r.id == id && r.customer_id == customer_id));
            removed = rules.len() != before;
            removed
        })?;
        if removed {
            tracing::info!(rule_id = %id, customer_id = %customer_id, "pricing rule removed");
        }
        Ok(removed)
    }

    /// Rules for one customer, in insertion order.
    pub fn rules_for(&self, customer_id: CustomerId) -> ServiceResult<Vec<PricingRule>> {
        Ok(self
            .rules
            .snapshot()?
            .into_iter()
            .filter(|r| r.customer_id == customer_id)
            .collect())
    }

    /// Resolve with provenance. Unknown customers fall through to the global fallback.
    pub fn resolve(&self, customer_id: CustomerId, fabric: &str, design: &str) -> ServiceResult<PriceResolution> {
        let customer_default = self
            .customers
            .get(&customer_id)?
            .and_then(|c| c.default_price_per_meter);
        let rules = self.rules.snapshot()?;
        Ok(resolve_price(&rules, customer_id, customer_default, fabric, design))
    }

    pub fn resolve_price(&self, customer_id: CustomerId, fabric: &str, design: &str) -> ServiceResult<Decimal> {
        Ok(self.resolve(customer_id, fabric, design)?.price_per_meter)
    }

    /// Price function over a fixed snapshot, for pricing many lines at once.
    pub fn price_table(&self, customer_id: CustomerId) -> ServiceResult<impl Fn(&str, &str) -> Decimal + use<>> {
        let customer_default = self
            .customers
            .get(&customer_id)?
            .and_then(|c| c.default_price_per_meter);
        let rules = self.rules.snapshot()?;
        Ok(move |fabric: &str, design: &str| {
            resolve_price(&rules, customer_id, customer_default, fabric, design).price_per_meter
        })
    }
}
