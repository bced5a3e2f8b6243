//! Labels for the production run recorded when an order is placed.

use printworks_core::UserId;

use crate::catalog::Catalog;
use crate::order::{DesignChoice, FabricChoice, FabricSource, FabricType, Order, OrderItem};

pub const UNKNOWN_DESIGN: &str = "Unknown design";
pub const UNKNOWN_FABRIC: &str = "Unknown fabric";

/// Human-readable design reference for the order's first line.
pub fn derived_design_ref(order: &Order, catalog: &dyn Catalog) -> String {
    first_item(order)
        .map(|item| design_label(&item.design, order.user_id, catalog))
        .unwrap_or_else(|| UNKNOWN_DESIGN.to_string())
}

/// Human-readable fabric label for the order's first line.
pub fn derived_fabric_label(order: &Order, catalog: &dyn Catalog) -> String {
    first_item(order)
        .map(|item| fabric_label(&item.fabric, catalog))
        .unwrap_or_else(|| UNKNOWN_FABRIC.to_string())
}

fn first_item(order: &Order) -> Option<&OrderItem> {
    order.items.first()
}

fn design_label(design: &DesignChoice, user_id: UserId, catalog: &dyn Catalog) -> String {
    let resolved = match design {
        DesignChoice::Preset { preset_id } => catalog.preset(preset_id).map(|p| p.name),
        DesignChoice::Library { design_id } => catalog.library_design(user_id, design_id).map(|d| d.name),
        DesignChoice::Uploaded { .. } => Some("Uploaded design".to_string()),
        DesignChoice::Repeat {
            original_order_id,
            design,
        } => match design.as_deref() {
            Some(printed) => return design_label(printed, user_id, catalog),
            None => Some(format!("Repeat of order {original_order_id}")),
        },
    };
    resolved
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_DESIGN.to_string())
}

fn fabric_label(fabric: &FabricChoice, catalog: &dyn Catalog) -> String {
    if let Some(named) = fabric
        .factory_fabric_id
        .as_deref()
        .and_then(|id| catalog.factory_fabric(id))
        .map(|f| f.name)
        .filter(|name| !name.trim().is_empty())
    {
        return named;
    }

    let kind = match fabric.fabric_type {
        FabricType::Natural => "Natural",
        FabricType::Synthetic => "Synthetic",
    };
    let source = match fabric.source {
        FabricSource::Factory => "factory",
        FabricSource::Customer => "customer-provided",
    };
    format!("{kind} fabric ({source})")
}
