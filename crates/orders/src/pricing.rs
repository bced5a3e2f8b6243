//! Fixed price tiers for web-shop orders.

use rust_decimal::Decimal;

use printworks_core::{DomainError, DomainResult};

use crate::catalog::Catalog;
use crate::order::{DesignChoice, FabricChoice, FabricSource, FabricType};

/// Base price per meter for a customer-uploaded design.
pub const UPLOAD_TIER: Decimal = Decimal::from_parts(150, 0, 0, false, 0);
/// Base price per meter when repeating an earlier order.
pub const REPEAT_TIER: Decimal = Decimal::from_parts(120, 0, 0, false, 0);
/// Base price per meter when nothing more specific applies.
pub const DEFAULT_TIER: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
/// Surcharge per meter for factory-provided natural fabric.
pub const NATURAL_SURCHARGE: Decimal = Decimal::from_parts(80, 0, 0, false, 0);
/// Surcharge per meter for factory-provided synthetic fabric.
pub const SYNTHETIC_SURCHARGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Unit price per meter: design base tier plus factory-fabric surcharge.
pub fn unit_price(design: &DesignChoice, fabric: &FabricChoice, catalog: &dyn Catalog) -> DomainResult<Decimal> {
    let base = match design {
        DesignChoice::Preset { preset_id } => catalog
            .preset(preset_id)
            .map(|p| p.base_price)
            .unwrap_or(DEFAULT_TIER),
        DesignChoice::Uploaded { .. } => UPLOAD_TIER,
        DesignChoice::Repeat { .. } => REPEAT_TIER,
        DesignChoice::Library { .. } => DEFAULT_TIER,
    };

    let surcharge = match (fabric.source, fabric.fabric_type) {
        (FabricSource::Customer, _) => Decimal::ZERO,
        (FabricSource::Factory, FabricType::Natural) => NATURAL_SURCHARGE,
        (FabricSource::Factory, FabricType::Synthetic) => SYNTHETIC_SURCHARGE,
    };

    base.checked_add(surcharge)
        .ok_or_else(|| DomainError::validation("unit price is too large"))
}
