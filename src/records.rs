// Record types for the two warehouse snapshots
// Retail consumption rows + firm/employment segment rows

use serde::{Deserialize, Serialize};

// ============================================================================
// CATEGORIES
// ============================================================================

/// The nine retail spending categories tracked by the consumption table.
///
/// `ALL` preserves the declaration order, which doubles as the tie-break
/// order when category totals are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fuel,
    Food,
    BeverageTobacco,
    PharmacyCosmetics,
    ApparelFootwear,
    HomeElectronics,
    ConstructionMaterials,
    MiscConsumerGoods,
    AutoParts,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Fuel,
        Category::Food,
        Category::BeverageTobacco,
        Category::PharmacyCosmetics,
        Category::ApparelFootwear,
        Category::HomeElectronics,
        Category::ConstructionMaterials,
        Category::MiscConsumerGoods,
        Category::AutoParts,
    ];

    /// Column name in the warehouse table.
    pub fn column(&self) -> &'static str {
        match self {
            Category::Fuel => "combustible",
            Category::Food => "alimentos",
            Category::BeverageTobacco => "bebida_tabaco",
            Category::PharmacyCosmetics => "farmacia_costetico_higiene",
            Category::ApparelFootwear => "vestuario_calzados_acc",
            Category::HomeElectronics => "electronicos_hogar_tecno",
            Category::ConstructionMaterials => "materiales_constru",
            Category::MiscConsumerGoods => "bienes_consumo_diverso",
            Category::AutoParts => "repuestos_auto",
        }
    }

    /// Human-readable label for tables and charts.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Fuel => "Fuel",
            Category::Food => "Food",
            Category::BeverageTobacco => "Beverages & Tobacco",
            Category::PharmacyCosmetics => "Pharmacy & Cosmetics",
            Category::ApparelFootwear => "Apparel & Footwear",
            Category::HomeElectronics => "Home Electronics",
            Category::ConstructionMaterials => "Construction Materials",
            Category::MiscConsumerGoods => "Misc Consumer Goods",
            Category::AutoParts => "Auto Parts",
        }
    }

    /// Short label that fits a bar chart axis.
    pub fn abbrev(&self) -> &'static str {
        match self {
            Category::Fuel => "Fuel",
            Category::Food => "Food",
            Category::BeverageTobacco => "Bev",
            Category::PharmacyCosmetics => "Pharm",
            Category::ApparelFootwear => "Appar",
            Category::HomeElectronics => "Elec",
            Category::ConstructionMaterials => "Const",
            Category::MiscConsumerGoods => "Misc",
            Category::AutoParts => "Auto",
        }
    }
}

// ============================================================================
// SALES RECORD
// ============================================================================

/// Format a `(year, month)` pair as the canonical "YYYY-MM" period key.
pub fn period_label(year: i32, month: u32) -> String {
    format!("{}-{:02}", year, month)
}

/// One cleaned row of the retail consumption snapshot.
///
/// `period` is derived once during cleaning and never mutated afterwards.
/// Wire names follow the warehouse columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    #[serde(rename = "anio")]
    pub year: i32,

    #[serde(rename = "mes")]
    pub month: u32,

    #[serde(rename = "venta_total")]
    pub total_sales: f64,

    #[serde(rename = "combustible", default)]
    pub fuel: f64,

    #[serde(rename = "alimentos", default)]
    pub food: f64,

    #[serde(rename = "bebida_tabaco", default)]
    pub beverage_tobacco: f64,

    #[serde(rename = "farmacia_costetico_higiene", default)]
    pub pharmacy_cosmetics: f64,

    #[serde(rename = "vestuario_calzados_acc", default)]
    pub apparel_footwear: f64,

    #[serde(rename = "electronicos_hogar_tecno", default)]
    pub home_electronics: f64,

    #[serde(rename = "materiales_constru", default)]
    pub construction_materials: f64,

    #[serde(rename = "bienes_consumo_diverso", default)]
    pub misc_consumer_goods: f64,

    #[serde(rename = "repuestos_auto", default)]
    pub auto_parts: f64,

    #[serde(rename = "periodo")]
    pub period: String,
}

impl SalesRecord {
    /// Record with the given keys and total, all category amounts zero.
    pub fn with_total(year: i32, month: u32, total_sales: f64) -> Self {
        SalesRecord {
            year,
            month,
            total_sales,
            fuel: 0.0,
            food: 0.0,
            beverage_tobacco: 0.0,
            pharmacy_cosmetics: 0.0,
            apparel_footwear: 0.0,
            home_electronics: 0.0,
            construction_materials: 0.0,
            misc_consumer_goods: 0.0,
            auto_parts: 0.0,
            period: period_label(year, month),
        }
    }

    /// Amount spent in one category.
    pub fn category_amount(&self, category: Category) -> f64 {
        match category {
            Category::Fuel => self.fuel,
            Category::Food => self.food,
            Category::BeverageTobacco => self.beverage_tobacco,
            Category::PharmacyCosmetics => self.pharmacy_cosmetics,
            Category::ApparelFootwear => self.apparel_footwear,
            Category::HomeElectronics => self.home_electronics,
            Category::ConstructionMaterials => self.construction_materials,
            Category::MiscConsumerGoods => self.misc_consumer_goods,
            Category::AutoParts => self.auto_parts,
        }
    }

    /// Set the amount for one category (used by the cleaner).
    pub fn set_category_amount(&mut self, category: Category, amount: f64) {
        match category {
            Category::Fuel => self.fuel = amount,
            Category::Food => self.food = amount,
            Category::BeverageTobacco => self.beverage_tobacco = amount,
            Category::PharmacyCosmetics => self.pharmacy_cosmetics = amount,
            Category::ApparelFootwear => self.apparel_footwear = amount,
            Category::HomeElectronics => self.home_electronics = amount,
            Category::ConstructionMaterials => self.construction_materials = amount,
            Category::MiscConsumerGoods => self.misc_consumer_goods = amount,
            Category::AutoParts => self.auto_parts = amount,
        }
    }
}

// ============================================================================
// BUSINESS SEGMENT RECORD
// ============================================================================

/// One row of the firm/employment snapshot: one business-size segment
/// (tramo) within a region and fiscal year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSegmentRecord {
    #[serde(rename = "anio_comercial")]
    pub fiscal_year: i32,

    #[serde(rename = "id_region")]
    pub region_id: String,

    #[serde(rename = "id_tramo")]
    pub segment_id: String,

    #[serde(rename = "num_empresas")]
    pub num_businesses: i64,

    #[serde(rename = "num_trabajadores_dependientes")]
    pub num_employees: i64,

    #[serde(rename = "ventas_uf")]
    pub sales_uf: f64,
}

impl BusinessSegmentRecord {
    pub fn new(
        fiscal_year: i32,
        region_id: &str,
        segment_id: &str,
        num_businesses: i64,
        num_employees: i64,
        sales_uf: f64,
    ) -> Self {
        BusinessSegmentRecord {
            fiscal_year,
            region_id: region_id.to_string(),
            segment_id: segment_id.to_string(),
            num_businesses,
            num_employees,
            sales_uf,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_label_zero_pads_month() {
        assert_eq!(period_label(2024, 3), "2024-03");
        assert_eq!(period_label(2024, 11), "2024-11");
    }

    #[test]
    fn test_category_declaration_order() {
        assert_eq!(Category::ALL[0], Category::Fuel);
        assert_eq!(Category::ALL[8], Category::AutoParts);
        assert_eq!(Category::ALL.len(), 9);
    }

    #[test]
    fn test_category_amount_roundtrip() {
        let mut record = SalesRecord::with_total(2024, 1, 100.0);

        for (i, category) in Category::ALL.iter().enumerate() {
            record.set_category_amount(*category, i as f64);
        }

        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(record.category_amount(*category), i as f64);
        }
    }

    #[test]
    fn test_with_total_derives_period() {
        let record = SalesRecord::with_total(2023, 7, 42.0);
        assert_eq!(record.period, "2023-07");
        assert_eq!(record.fuel, 0.0);
    }
}
