//! # Record Normalizer
//!
//! Pure transforms from raw source records into storage rows. Reference
//! guids are resolved (zero guid and empty string mean "none"), configured
//! unit guids become the base unit, and additional-property rows fill the
//! weight and visibility fields. Normalization is fallible per record and
//! the whole run fails on the first bad record.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use core_catalog::models::{
    BaseUnit, Manufacturer, MeasurementUnit, Nomenclature, NomenclatureType, PriceEntry,
    StockLevel,
};

use crate::error::{Result, SyncError};
use crate::guids::SyncGuids;
use crate::source::{
    AttachedFileRecord, ManufacturerRecord, MeasurementUnitRecord, NomenclatureRecord,
    NomenclatureTypeRecord, PriceRecord, PropertyScalar, StockRecord,
};

/// The nil reference 1C uses where a guid field is unset
const ZERO_GUID: &str = "00000000-0000-0000-0000-000000000000";

/// Datetime layout of register period fields
const PERIOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Resolve a raw guid reference; empty and zero guid mean no reference
fn optional_guid(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == ZERO_GUID {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn optional_text(raw: String) -> Option<String> {
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

fn require_id(id: &str, entity: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(SyncError::Normalize {
            id: String::new(),
            reason: format!("{} record has an empty id", entity),
        });
    }
    Ok(())
}

/// Numeric value of the minimum-weight property
///
/// The source delivers it as a number or as text, sometimes with a decimal
/// comma. Anything else is a data error.
fn property_weight(record_id: &str, value: &PropertyScalar) -> Result<f64> {
    match value {
        PropertyScalar::Number(n) => Ok(*n),
        PropertyScalar::Text(s) => {
            s.trim().replace(',', ".").parse().map_err(|_| SyncError::Normalize {
                id: record_id.to_string(),
                reason: format!("minimum weight property is not numeric: {:?}", s),
            })
        }
        PropertyScalar::Flag(_) => Err(SyncError::Normalize {
            id: record_id.to_string(),
            reason: "minimum weight property is not numeric".to_string(),
        }),
    }
}

/// Normalize nomenclature records, resolving guids against the settings
pub fn normalize_nomenclature(
    records: Vec<NomenclatureRecord>,
    guids: &SyncGuids,
) -> Result<Vec<Nomenclature>> {
    records
        .into_iter()
        .map(|record| normalize_nomenclature_record(record, guids))
        .collect()
}

fn normalize_nomenclature_record(
    record: NomenclatureRecord,
    guids: &SyncGuids,
) -> Result<Nomenclature> {
    require_id(&record.id, "nomenclature")?;

    let base_unit = if record.unit_id == guids.kilogram_unit {
        Some(BaseUnit::Kilogram)
    } else if record.unit_id == guids.piece_unit {
        Some(BaseUnit::Piece)
    } else {
        None
    };

    let mut minimum_weight = None;
    let mut show_on_website = false;
    for property in &record.properties {
        if property.property_id == guids.minimum_weight_property {
            minimum_weight = Some(property_weight(&record.id, &property.value)?);
        } else if property.property_id == guids.show_on_website_property {
            show_on_website = property.value.as_flag().unwrap_or(false);
        }
    }

    Ok(Nomenclature {
        parent_id: optional_guid(&record.parent_id),
        type_id: optional_guid(&record.type_id),
        unit_id: optional_guid(&record.unit_id),
        manufacturer_id: record.manufacturer_id.as_deref().and_then(optional_guid),
        id: record.id,
        is_folder: record.is_folder,
        name: record.name,
        code: optional_text(record.code),
        description: record.description.and_then(optional_text),
        data_version: record.data_version,
        deletion_mark: record.deletion_mark,
        base_unit,
        is_weight_goods: record.use_weight,
        minimum_weight,
        show_on_website,
        cover_image: None,
    })
}

/// Normalize nomenclature type records
pub fn normalize_nomenclature_types(
    records: Vec<NomenclatureTypeRecord>,
) -> Result<Vec<NomenclatureType>> {
    records
        .into_iter()
        .map(|record| {
            require_id(&record.id, "nomenclature type")?;
            Ok(NomenclatureType {
                parent_id: optional_guid(&record.parent_id),
                id: record.id,
                is_folder: record.is_folder,
                name: record.name,
                description: record.description.and_then(optional_text),
                data_version: record.data_version,
                deletion_mark: record.deletion_mark,
            })
        })
        .collect()
}

/// Normalize manufacturer records
pub fn normalize_manufacturers(records: Vec<ManufacturerRecord>) -> Result<Vec<Manufacturer>> {
    records
        .into_iter()
        .map(|record| {
            require_id(&record.id, "manufacturer")?;
            Ok(Manufacturer {
                id: record.id,
                name: record.name,
                data_version: record.data_version,
                deletion_mark: record.deletion_mark,
            })
        })
        .collect()
}

/// Normalize measurement unit records
pub fn normalize_measurement_units(
    records: Vec<MeasurementUnitRecord>,
) -> Result<Vec<MeasurementUnit>> {
    records
        .into_iter()
        .map(|record| {
            require_id(&record.id, "measurement unit")?;
            Ok(MeasurementUnit {
                owner_id: optional_guid(&record.owner_id),
                id: record.id,
                name: record.name,
                weight: record.weight,
                numerator: record.numerator,
                denominator: record.denominator,
                data_version: record.data_version,
                deletion_mark: record.deletion_mark,
            })
        })
        .collect()
}

/// Normalize price register rows, parsing the period datetime
pub fn normalize_prices(records: Vec<PriceRecord>) -> Result<Vec<PriceEntry>> {
    records
        .into_iter()
        .map(|record| {
            require_id(&record.nomenclature_id, "price")?;

            let period = match record.period.trim() {
                "" => None,
                raw => Some(
                    NaiveDateTime::parse_from_str(raw, PERIOD_FORMAT)
                        .map_err(|_| SyncError::Normalize {
                            id: record.nomenclature_id.clone(),
                            reason: format!("price period is not a source datetime: {:?}", raw),
                        })?
                        .and_utc()
                        .timestamp(),
                ),
            };

            Ok(PriceEntry {
                package_id: optional_guid(&record.package_id),
                recorder: optional_text(record.recorder),
                nomenclature_id: record.nomenclature_id,
                price: record.price,
                period,
            })
        })
        .collect()
}

/// Normalize stock register rows
pub fn normalize_stock(records: Vec<StockRecord>) -> Result<Vec<StockLevel>> {
    records
        .into_iter()
        .map(|record| {
            require_id(&record.nomenclature_id, "stock")?;
            Ok(StockLevel {
                nomenclature_id: record.nomenclature_id,
                available: record.available,
                reserved_stock: record.reserved_stock,
                reserved_orders: record.reserved_orders,
            })
        })
        .collect()
}

/// Merge attached files onto normalized nomenclature rows
///
/// A file whose owner matches a row sets that row's cover image to the
/// file path with backslashes rewritten; files without a matching owner
/// are ignored, and a later file for the same owner wins.
pub fn attach_cover_images(items: &mut [Nomenclature], files: &[AttachedFileRecord]) {
    let index_by_id: HashMap<String, usize> = items
        .iter()
        .enumerate()
        .map(|(index, item)| (item.id.clone(), index))
        .collect();

    for file in files {
        if let Some(&index) = index_by_id.get(&file.owner_id) {
            items[index].cover_image = Some(file.path.replace('\\', "/"));
        }
    }
}

fn dedupe_last_wins<T>(items: Vec<T>, key_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for item in items {
        let key = key_of(&item).to_string();
        match index_of.get(&key) {
            Some(&index) => kept[index] = item,
            None => {
                index_of.insert(key, kept.len());
                kept.push(item);
            }
        }
    }

    kept
}

/// Collapse duplicate price rows for one item, keeping the last one
pub fn dedupe_prices(entries: Vec<PriceEntry>) -> Vec<PriceEntry> {
    dedupe_last_wins(entries, |entry| entry.nomenclature_id.as_str())
}

/// Collapse duplicate stock rows for one item, keeping the last one
pub fn dedupe_stock(levels: Vec<StockLevel>) -> Vec<StockLevel> {
    dedupe_last_wins(levels, |level| level.nomenclature_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PropertyValue;

    fn test_guids() -> SyncGuids {
        SyncGuids {
            warehouse: "wh-guid".to_string(),
            default_price_type: "pt-guid".to_string(),
            kilogram_unit: "kg-guid".to_string(),
            piece_unit: "pc-guid".to_string(),
            minimum_weight_property: "mw-prop".to_string(),
            show_on_website_property: "sw-prop".to_string(),
        }
    }

    fn raw_item(id: &str) -> NomenclatureRecord {
        NomenclatureRecord {
            id: id.to_string(),
            parent_id: ZERO_GUID.to_string(),
            type_id: "type-1".to_string(),
            is_folder: false,
            name: format!("Item {}", id),
            code: "00042".to_string(),
            description: Some(String::new()),
            unit_id: "kg-guid".to_string(),
            manufacturer_id: None,
            use_weight: true,
            data_version: "v1".to_string(),
            deletion_mark: false,
            properties: Vec::new(),
        }
    }

    #[test]
    fn test_nomenclature_guid_resolution() {
        let mut record = raw_item("n-1");
        record.manufacturer_id = Some(ZERO_GUID.to_string());

        let rows = normalize_nomenclature(vec![record], &test_guids()).unwrap();
        let row = &rows[0];

        assert_eq!(row.parent_id, None);
        assert_eq!(row.type_id.as_deref(), Some("type-1"));
        assert_eq!(row.manufacturer_id, None);
        assert_eq!(row.base_unit, Some(BaseUnit::Kilogram));
        assert_eq!(row.description, None);
        assert!(row.is_weight_goods);
    }

    #[test]
    fn test_piece_unit_and_unconfigured_unit() {
        let mut piece = raw_item("n-1");
        piece.unit_id = "pc-guid".to_string();
        let mut other = raw_item("n-2");
        other.unit_id = "box-guid".to_string();

        let rows = normalize_nomenclature(vec![piece, other], &test_guids()).unwrap();

        assert_eq!(rows[0].base_unit, Some(BaseUnit::Piece));
        assert_eq!(rows[1].base_unit, None);
    }

    #[test]
    fn test_properties_fill_weight_and_visibility() {
        let mut record = raw_item("n-1");
        record.properties = vec![
            PropertyValue {
                property_id: "mw-prop".to_string(),
                value: PropertyScalar::Text("0,45".to_string()),
            },
            PropertyValue {
                property_id: "sw-prop".to_string(),
                value: PropertyScalar::Flag(true),
            },
            PropertyValue {
                property_id: "unrelated".to_string(),
                value: PropertyScalar::Text("ignored".to_string()),
            },
        ];

        let rows = normalize_nomenclature(vec![record], &test_guids()).unwrap();

        assert_eq!(rows[0].minimum_weight, Some(0.45));
        assert!(rows[0].show_on_website);
    }

    #[test]
    fn test_missing_properties_stay_unset() {
        let rows = normalize_nomenclature(vec![raw_item("n-1")], &test_guids()).unwrap();

        assert_eq!(rows[0].minimum_weight, None);
        assert!(!rows[0].show_on_website);
    }

    #[test]
    fn test_garbage_weight_property_fails_the_run() {
        let mut record = raw_item("n-1");
        record.properties = vec![PropertyValue {
            property_id: "mw-prop".to_string(),
            value: PropertyScalar::Text("about half a kilo".to_string()),
        }];

        let result = normalize_nomenclature(vec![record], &test_guids());
        assert!(matches!(
            result,
            Err(SyncError::Normalize { id, .. }) if id == "n-1"
        ));
    }

    #[test]
    fn test_empty_id_fails_the_run() {
        let record = raw_item("  ");

        let result = normalize_nomenclature(vec![record], &test_guids());
        assert!(matches!(result, Err(SyncError::Normalize { .. })));
    }

    #[test]
    fn test_price_period_parsing() {
        let records = vec![
            PriceRecord {
                nomenclature_id: "n-1".to_string(),
                package_id: ZERO_GUID.to_string(),
                price: 199.9,
                period: "2024-01-15T10:30:00".to_string(),
                recorder: "doc-1".to_string(),
            },
            PriceRecord {
                nomenclature_id: "n-2".to_string(),
                package_id: String::new(),
                price: 5.0,
                period: String::new(),
                recorder: String::new(),
            },
        ];

        let entries = normalize_prices(records).unwrap();

        assert_eq!(entries[0].period, Some(1_705_314_600));
        assert_eq!(entries[0].package_id, None);
        assert_eq!(entries[0].recorder.as_deref(), Some("doc-1"));
        assert_eq!(entries[1].period, None);
        assert_eq!(entries[1].recorder, None);
    }

    #[test]
    fn test_garbage_price_period_fails_the_run() {
        let records = vec![PriceRecord {
            nomenclature_id: "n-1".to_string(),
            package_id: String::new(),
            price: 1.0,
            period: "15.01.2024".to_string(),
            recorder: String::new(),
        }];

        let result = normalize_prices(records);
        assert!(matches!(
            result,
            Err(SyncError::Normalize { id, .. }) if id == "n-1"
        ));
    }

    #[test]
    fn test_attach_cover_images_rewrites_separators() {
        let mut items = normalize_nomenclature(
            vec![raw_item("n-1"), raw_item("n-2")],
            &test_guids(),
        )
        .unwrap();
        let files = vec![
            AttachedFileRecord {
                id: "f-1".to_string(),
                owner_id: "n-2".to_string(),
                path: "images\\catalog\\item.png".to_string(),
            },
            AttachedFileRecord {
                id: "f-2".to_string(),
                owner_id: "missing".to_string(),
                path: "orphan.png".to_string(),
            },
        ];

        attach_cover_images(&mut items, &files);

        assert_eq!(items[0].cover_image, None);
        assert_eq!(
            items[1].cover_image.as_deref(),
            Some("images/catalog/item.png")
        );
    }

    #[test]
    fn test_later_file_for_same_owner_wins() {
        let mut items = normalize_nomenclature(vec![raw_item("n-1")], &test_guids()).unwrap();
        let files = vec![
            AttachedFileRecord {
                id: "f-1".to_string(),
                owner_id: "n-1".to_string(),
                path: "old.png".to_string(),
            },
            AttachedFileRecord {
                id: "f-2".to_string(),
                owner_id: "n-1".to_string(),
                path: "new.png".to_string(),
            },
        ];

        attach_cover_images(&mut items, &files);

        assert_eq!(items[0].cover_image.as_deref(), Some("new.png"));
    }

    #[test]
    fn test_dedupe_keeps_last_value_in_first_position() {
        let entries = vec![
            PriceEntry {
                nomenclature_id: "n-1".to_string(),
                package_id: None,
                price: 10.0,
                period: None,
                recorder: None,
            },
            PriceEntry {
                nomenclature_id: "n-2".to_string(),
                package_id: None,
                price: 20.0,
                period: None,
                recorder: None,
            },
            PriceEntry {
                nomenclature_id: "n-1".to_string(),
                package_id: None,
                price: 15.0,
                period: None,
                recorder: None,
            },
        ];

        let deduped = dedupe_prices(entries);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].nomenclature_id, "n-1");
        assert_eq!(deduped[0].price, 15.0);
        assert_eq!(deduped[1].nomenclature_id, "n-2");
    }
}
