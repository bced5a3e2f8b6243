use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use printworks_core::{CustomerId, DomainError, DomainResult, Entity, MatchKey};

/// Fixed id of the reserved customer that owns runs derived from web-shop orders.
pub const WEB_ORDERS_CUSTOMER_ID: CustomerId =
    CustomerId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0001));

/// Display name of the reserved web-orders customer.
pub const WEB_ORDERS_CUSTOMER_NAME: &str = "Web Orders";

/// Contact information for a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Billing-side customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerEntity {
    pub id: CustomerId,
    pub name: String,
    /// Alternative spellings seen in imported spreadsheets.
    #[serde(default)]
    pub aliases: Vec<String>,
    pub default_price_per_meter: Option<Decimal>,
    pub default_discount_pct: Option<Decimal>,
    #[serde(default)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for CustomerEntity {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for registering a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub default_price_per_meter: Option<Decimal>,
    pub default_discount_pct: Option<Decimal>,
    #[serde(default)]
    pub contact: ContactInfo,
}

/// Partial update; `None` keeps the existing value.
///
/// The two defaults are doubly optional so a caller can clear them
/// (`Some(None)`, JSON `null`) as well as leave them alone (`None`, field absent).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present_field", skip_serializing_if = "Option::is_none")]
    pub default_price_per_meter: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "present_field", skip_serializing_if = "Option::is_none")]
    pub default_discount_pct: Option<Option<Decimal>>,
    pub contact: Option<ContactInfo>,
}

/// A field that is present, even as `null`, decodes to `Some`.
fn present_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CustomerEntity {
    pub fn register(id: CustomerId, input: NewCustomer, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = validate_name(&input.name)?;
        validate_defaults(input.default_price_per_meter, input.default_discount_pct)?;

        Ok(Self {
            id,
            name,
            aliases: clean_aliases(input.aliases),
            default_price_per_meter: input.default_price_per_meter,
            default_discount_pct: input.default_discount_pct,
            contact: input.contact,
            created_at: now,
            updated_at: now,
        })
    }

    /// The reserved customer that web-shop order runs are pinned to.
    pub fn web_orders(now: DateTime<Utc>) -> Self {
        Self {
            id: WEB_ORDERS_CUSTOMER_ID,
            name: WEB_ORDERS_CUSTOMER_NAME.to_string(),
            aliases: Vec::new(),
            default_price_per_meter: None,
            default_discount_pct: None,
            contact: ContactInfo::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_web_orders(&self) -> bool {
        self.id == WEB_ORDERS_CUSTOMER_ID
            || MatchKey::new(&self.name) == MatchKey::new(WEB_ORDERS_CUSTOMER_NAME)
    }

    /// Apply a partial update. The record is left untouched on validation failure.
    pub fn apply_update(&mut self, update: CustomerUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        let name = match update.name {
            Some(ref n) => validate_name(n)?,
            None => self.name.clone(),
        };
        let price = update
            .default_price_per_meter
            .unwrap_or(self.default_price_per_meter);
        let discount = update.default_discount_pct.unwrap_or(self.default_discount_pct);
        validate_defaults(price, discount)?;

        self.name = name;
        self.default_price_per_meter = price;
        self.default_discount_pct = discount;
        if let Some(aliases) = update.aliases {
            self.aliases = clean_aliases(aliases);
        }
        if let Some(contact) = update.contact {
            self.contact = contact;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Whether `key` matches the display name or any alias.
    pub fn answers_to(&self, key: &MatchKey) -> bool {
        if key.is_empty() {
            return false;
        }
        MatchKey::new(&self.name) == *key || self.aliases.iter().any(|a| MatchKey::new(a) == *key)
    }
}

/// Find a customer by display name or alias.
///
/// Exact display-name matches win over alias matches; within each tier the first
/// customer in slice order wins.
pub fn find_by_name<'a>(customers: &'a [CustomerEntity], raw: &str) -> Option<&'a CustomerEntity> {
    let key = MatchKey::new(raw);
    if key.is_empty() {
        return None;
    }
    customers
        .iter()
        .find(|c| MatchKey::new(&c.name) == key)
        .or_else(|| customers.iter().find(|c| c.answers_to(&key)))
}

fn validate_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("customer name must not be empty"));
    }
    Ok(name.to_string())
}

fn validate_defaults(price: Option<Decimal>, discount: Option<Decimal>) -> DomainResult<()> {
    if matches!(price, Some(p) if p.is_sign_negative()) {
        return Err(DomainError::validation(
            "default price per meter must not be negative",
        ));
    }
    if matches!(discount, Some(d) if d.is_sign_negative() || d > Decimal::ONE_HUNDRED) {
        return Err(DomainError::validation(
            "default discount must be between 0 and 100 percent",
        ));
    }
    Ok(())
}

fn clean_aliases(aliases: Vec<String>) -> Vec<String> {
    let mut seen: Vec<MatchKey> = Vec::new();
    let mut out = Vec::new();
    for alias in aliases {
        let key = MatchKey::new(&alias);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(alias.trim().to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn register(name: &str, aliases: &[&str]) -> CustomerEntity {
        CustomerEntity::register(
            CustomerId::new(),
            NewCustomer {
                name: name.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
                ..NewCustomer::default()
            },
            test_time(),
        )
        .unwrap()
    }

    #[test]
    fn register_trims_name_and_dedupes_aliases() {
        let c = register("  Nile Textiles ", &["NILE", " nile ", "", "Nile Tex"]);
        assert_eq!(c.name, "Nile Textiles");
        assert_eq!(c.aliases, vec!["NILE".to_string(), "Nile Tex".to_string()]);
    }

    #[test]
    fn register_rejects_empty_name() {
        let err = CustomerEntity::register(
            CustomerId::new(),
            NewCustomer {
                name: "   ".to_string(),
                ..NewCustomer::default()
            },
            test_time(),
        )
        .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("name must not be empty") => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn register_rejects_out_of_range_discount() {
        let err = CustomerEntity::register(
            CustomerId::new(),
            NewCustomer {
                name: "Delta".to_string(),
                default_discount_pct: Some(Decimal::from(101)),
                ..NewCustomer::default()
            },
            test_time(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn update_can_clear_defaults_and_keeps_record_on_failure() {
        let mut c = CustomerEntity::register(
            CustomerId::new(),
            NewCustomer {
                name: "Delta".to_string(),
                default_price_per_meter: Some(Decimal::from(12)),
                ..NewCustomer::default()
            },
            test_time(),
        )
        .unwrap();

        let before = c.clone();
        let err = c
            .apply_update(
                CustomerUpdate {
                    name: Some("Delta Prints".to_string()),
                    default_price_per_meter: Some(Some(Decimal::from(-1))),
                    ..CustomerUpdate::default()
                },
                test_time(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(c, before);

        c.apply_update(
            CustomerUpdate {
                default_price_per_meter: Some(None),
                ..CustomerUpdate::default()
            },
            test_time(),
        )
        .unwrap();
        assert_eq!(c.default_price_per_meter, None);
        assert_eq!(c.name, "Delta");
    }

    #[test]
    fn json_null_clears_a_default_and_absence_keeps_it() {
        let cleared: CustomerUpdate = serde_json::from_str(r#"{"default_price_per_meter": null}"#).unwrap();
        assert_eq!(cleared.default_price_per_meter, Some(None));
        assert_eq!(cleared.default_discount_pct, None);

        let set: CustomerUpdate = serde_json::from_str(r#"{"default_discount_pct": "5"}"#).unwrap();
        assert_eq!(set.default_discount_pct, Some(Some(Decimal::from(5))));

        let mut c = CustomerEntity::register(
            CustomerId::new(),
            NewCustomer {
                name: "Aswan Dyes".to_string(),
                default_price_per_meter: Some(Decimal::from(12)),
                default_discount_pct: Some(Decimal::from(2)),
                ..NewCustomer::default()
            },
            test_time(),
        )
        .unwrap();
        c.apply_update(cleared, test_time()).unwrap();
        assert_eq!(c.default_price_per_meter, None);
        assert_eq!(c.default_discount_pct, Some(Decimal::from(2)));
    }

    #[test]
    fn find_by_name_prefers_display_name_over_alias() {
        let a = register("Cairo Mills", &["Delta"]);
        let b = register("Delta", &[]);
        let customers = vec![a, b.clone()];

        assert_eq!(find_by_name(&customers, " delta ").map(|c| c.id), Some(b.id));
        assert_eq!(
            find_by_name(&customers, "CAIRO MILLS").map(|c| c.name.as_str()),
            Some("Cairo Mills")
        );
        assert!(find_by_name(&customers, "").is_none());
        assert!(find_by_name(&customers, "Unknown").is_none());
    }

    #[test]
    fn web_orders_customer_is_recognized_by_id_or_name() {
        let reserved = CustomerEntity::web_orders(test_time());
        assert!(reserved.is_web_orders());

        let by_name = register(" web orders", &[]);
        assert!(by_name.is_web_orders());
        assert!(!register("Cairo Mills", &[]).is_web_orders());
    }

    proptest! {
        /// Property: a customer always answers to every alias it was registered with,
        /// regardless of surrounding whitespace or letter case.
        #[test]
        fn answers_to_registered_aliases(alias in "[a-zA-Z][a-zA-Z ]{0,12}[a-zA-Z]") {
            let c = register("Base", &[alias.as_str()]);
            let shouted = format!("  {}  ", alias.to_uppercase());
            prop_assert!(c.answers_to(&MatchKey::new(&shouted)));
        }
    }
}
