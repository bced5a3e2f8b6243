use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printworks_core::{CustomerId, DomainError, DomainResult, Entity, MatchKey, PricingRuleId};

/// Price per meter used when no rule and no customer default applies.
pub const FALLBACK_PRICE_PER_METER: Decimal = Decimal::from_parts(1000, 0, 0, false, 2);

/// Customer price override, optionally scoped by fabric and/or design.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: PricingRuleId,
    pub customer_id: CustomerId,
    pub fabric: Option<String>,
    pub design: Option<String>,
    pub price_per_meter: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Entity for PricingRule {
    type Id = PricingRuleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for adding a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPricingRule {
    pub customer_id: CustomerId,
    pub fabric: Option<String>,
    pub design: Option<String>,
    pub price_per_meter: Decimal,
}

impl PricingRule {
    pub fn create(id: PricingRuleId, input: NewPricingRule, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.price_per_meter.is_sign_negative() {
            return Err(DomainError::validation("price per meter must not be negative"));
        }

        Ok(Self {
            id,
            customer_id: input.customer_id,
            fabric: clean(input.fabric),
            design: clean(input.design),
            price_per_meter: input.price_per_meter,
            created_at: now,
        })
    }

    fn fabric_key(&self) -> Option<MatchKey> {
        MatchKey::optional(self.fabric.as_deref())
    }

    fn design_key(&self) -> Option<MatchKey> {
        MatchKey::optional(self.design.as_deref())
    }
}

/// Which step of the precedence chain produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    FabricAndDesignRule(PricingRuleId),
    FabricRule(PricingRuleId),
    DesignRule(PricingRuleId),
    CustomerDefault,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceResolution {
    pub price_per_meter: Decimal,
    pub source: PriceSource,
}

/// Resolve the price per meter for `customer_id`, most specific rule first:
///
/// 1. fabric and design both match
/// 2. fabric matches, rule has no design
/// 3. design matches, rule has no fabric
/// 4. the customer's default price
/// 5. [`FALLBACK_PRICE_PER_METER`]
///
/// `rules` may contain other customers' rules; they are ignored. Among equally
/// specific rules the first in slice order wins, so callers must pass rules in
/// insertion order.
pub fn resolve_price(
    rules: &[PricingRule],
    customer_id: CustomerId,
    customer_default: Option<Decimal>,
    fabric: &str,
    design: &str,
) -> PriceResolution {
    let fabric = MatchKey::new(fabric);
    let design = MatchKey::new(design);
    let own: Vec<&PricingRule> = rules.iter().filter(|r| r.customer_id == customer_id).collect();

    let exact = own.iter().find(|r| {
        r.fabric_key().as_ref() == Some(&fabric) && r.design_key().as_ref() == Some(&design)
    });
    if let Some(rule) = exact {
        return PriceResolution {
            price_per_meter: rule.price_per_meter,
            source: PriceSource::FabricAndDesignRule(rule.id),
        };
    }

    let by_fabric = own
        .iter()
        .find(|r| r.design_key().is_none() && r.fabric_key().as_ref() == Some(&fabric));
    if let Some(rule) = by_fabric {
        return PriceResolution {
            price_per_meter: rule.price_per_meter,
            source: PriceSource::FabricRule(rule.id),
        };
    }

    let by_design = own
        .iter()
        .find(|r| r.fabric_key().is_none() && r.design_key().as_ref() == Some(&design));
    if let Some(rule) = by_design {
        return PriceResolution {
            price_per_meter: rule.price_per_meter,
            source: PriceSource::DesignRule(rule.id),
        };
    }

    match customer_default {
        Some(price) => PriceResolution {
            price_per_meter: price,
            source: PriceSource::CustomerDefault,
        },
        None => PriceResolution {
            price_per_meter: FALLBACK_PRICE_PER_METER,
            source: PriceSource::Fallback,
        },
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn rule(customer_id: CustomerId, fabric: Option<&str>, design: Option<&str>, price: i64) -> PricingRule {
        PricingRule::create(
            PricingRuleId::new(),
            NewPricingRule {
                customer_id,
                fabric: fabric.map(str::to_string),
                design: design.map(str::to_string),
                price_per_meter: Decimal::from(price),
            },
            test_time(),
        )
        .unwrap()
    }

    #[test]
    fn fabric_and_design_rule_beats_fabric_only_rule() {
        let customer = CustomerId::new();
        let rules = vec![
            rule(customer, Some("Polyester"), None, 20),
            rule(customer, Some("Polyester"), Some("Stripes"), 35),
        ];

        let resolved = resolve_price(&rules, customer, None, " polyester", "STRIPES ");
        assert_eq!(resolved.price_per_meter, Decimal::from(35));
        assert_eq!(resolved.source, PriceSource::FabricAndDesignRule(rules[1].id));
    }

    #[test]
    fn fabric_rule_beats_design_rule() {
        let customer = CustomerId::new();
        let rules = vec![
            rule(customer, None, Some("Stripes"), 18),
            rule(customer, Some("Cotton"), None, 22),
        ];

        let resolved = resolve_price(&rules, customer, Some(Decimal::from(5)), "cotton", "stripes");
        assert_eq!(resolved.price_per_meter, Decimal::from(22));
        assert_eq!(resolved.source, PriceSource::FabricRule(rules[1].id));
    }

    #[test]
    fn design_rule_applies_when_no_fabric_rule_matches() {
        let customer = CustomerId::new();
        let rules = vec![
            rule(customer, Some("Cotton"), None, 22),
            rule(customer, None, Some("Stripes"), 18),
        ];

        let resolved = resolve_price(&rules, customer, None, "Silk", "Stripes");
        assert_eq!(resolved.price_per_meter, Decimal::from(18));
    }

    #[test]
    fn scoped_rule_does_not_match_partially() {
        let customer = CustomerId::new();
        // Fabric matches but the rule also pins a different design: not applicable.
        let rules = vec![rule(customer, Some("Cotton"), Some("Dots"), 40)];

        let resolved = resolve_price(&rules, customer, Some(Decimal::from(12)), "Cotton", "Stripes");
        assert_eq!(resolved.price_per_meter, Decimal::from(12));
        assert_eq!(resolved.source, PriceSource::CustomerDefault);
    }

    #[test]
    fn ties_go_to_first_inserted_rule() {
        let customer = CustomerId::new();
        let rules = vec![
            rule(customer, Some("Cotton"), None, 21),
            rule(customer, Some(" COTTON "), None, 29),
        ];

        let resolved = resolve_price(&rules, customer, None, "cotton", "anything");
        assert_eq!(resolved.price_per_meter, Decimal::from(21));
    }

    #[test]
    fn other_customers_rules_are_ignored() {
        let customer = CustomerId::new();
        let other = CustomerId::new();
        let rules = vec![rule(other, Some("Cotton"), Some("Stripes"), 99)];

        let resolved = resolve_price(&rules, customer, None, "Cotton", "Stripes");
        assert_eq!(resolved.source, PriceSource::Fallback);
    }

    #[test]
    fn no_rules_and_no_default_yields_exact_fallback() {
        let resolved = resolve_price(&[], CustomerId::new(), None, "Cotton", "Stripes");
        assert_eq!(resolved.price_per_meter, FALLBACK_PRICE_PER_METER);
        assert_eq!(resolved.price_per_meter, Decimal::new(1000, 2));
        assert_eq!(resolved.source, PriceSource::Fallback);
    }

    #[test]
    fn blank_constraints_are_stored_as_absent() {
        let r = rule(CustomerId::new(), Some("   "), Some(" Dots "), 10);
        assert_eq!(r.fabric, None);
        assert_eq!(r.design.as_deref(), Some("Dots"));
    }

    #[test]
    fn negative_price_is_rejected() {
        let err = PricingRule::create(
            PricingRuleId::new(),
            NewPricingRule {
                customer_id: CustomerId::new(),
                fabric: None,
                design: None,
                price_per_meter: Decimal::from(-3),
            },
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        /// Property: whatever order the rules are stored in, a matching
        /// fabric+design rule always wins over a fabric-only rule.
        #[test]
        fn most_specific_rule_wins_in_any_order(
            fabric_only in 1i64..1000,
            exact in 1i64..1000,
            exact_first in any::<bool>(),
        ) {
            let customer = CustomerId::new();
            let a = rule(customer, Some("Linen"), None, fabric_only);
            let b = rule(customer, Some("Linen"), Some("Paisley"), exact);
            let rules = if exact_first { vec![b, a] } else { vec![a, b] };

            let resolved = resolve_price(&rules, customer, None, "LINEN", " paisley");
            prop_assert_eq!(resolved.price_per_meter, Decimal::from(exact));
        }
    }
}
