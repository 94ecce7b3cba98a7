//! 1C OData response types
//!
//! Data structures for deserializing the standard OData service of a 1C
//! installation. Field names on the wire mix English (`Ref_Key`,
//! `DataVersion`) and Russian (`ПутьКФайлу`, `Цена`); the serde renames
//! carry them exactly. Conversions into the neutral record types live next
//! to each entity.

use serde::Deserialize;

use core_sync::source::{
    AttachedFileRecord, ManufacturerRecord, MeasurementUnitRecord, NomenclatureRecord,
    NomenclatureTypeRecord, PriceRecord, PropertyScalar, PropertyValue, StockRecord,
};

/// Response envelope for OData collection reads
///
/// Success carries `value`; failures carry `odata.error`. 1C embeds query
/// errors in the body even when the HTTP status is 200, so both fields are
/// optional and the client inspects `error` first.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "odata.error")]
    pub error: Option<ODataErrorBody>,
    pub value: Option<Vec<T>>,
}

/// Embedded error payload
#[derive(Debug, Deserialize)]
pub struct ODataErrorBody {
    pub code: String,
    pub message: ODataErrorMessage,
}

#[derive(Debug, Deserialize)]
pub struct ODataErrorMessage {
    pub lang: String,
    pub value: String,
}

/// Nomenclature catalog entity
///
/// `Description` holds the display name in 1C; the long description text
/// lives in `Описание`.
#[derive(Debug, Clone, Deserialize)]
pub struct NomenclatureEntity {
    #[serde(rename = "Ref_Key")]
    pub ref_key: String,

    #[serde(rename = "Parent_Key")]
    pub parent_key: String,

    #[serde(rename = "IsFolder")]
    pub is_folder: bool,

    #[serde(rename = "ВидНоменклатуры_Key")]
    pub nomenclature_type_key: String,

    /// Display name
    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Code")]
    pub code: String,

    /// Long description text
    #[serde(rename = "Описание", default)]
    pub details: Option<String>,

    #[serde(rename = "ЕдиницаИзмерения_Key")]
    pub unit_key: String,

    /// Zero guid when the item has no manufacturer
    #[serde(rename = "Производитель_Key", default)]
    pub manufacturer_key: Option<String>,

    /// Sold by weight
    #[serde(rename = "ВесИспользовать", default)]
    pub use_weight: bool,

    #[serde(rename = "DataVersion")]
    pub data_version: String,

    #[serde(rename = "DeletionMark")]
    pub deletion_mark: bool,

    /// Additional-property tabular section
    #[serde(rename = "ДополнительныеРеквизиты", default)]
    pub additional_properties: Vec<PropertyValueEntity>,
}

/// One row of the additional-property tabular section
///
/// `Ref_Key` here is the owning item's reference, not a row identity.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyValueEntity {
    #[serde(rename = "Ref_Key")]
    pub ref_key: String,

    #[serde(rename = "Свойство_Key")]
    pub property_key: String,

    #[serde(rename = "Значение")]
    pub value: PropertyScalar,
}

/// Attached file entity for nomenclature cover images
#[derive(Debug, Clone, Deserialize)]
pub struct AttachedFileEntity {
    #[serde(rename = "Ref_Key")]
    pub ref_key: String,

    /// Storage path, backslash separators as 1C reports them
    #[serde(rename = "ПутьКФайлу")]
    pub file_path: String,

    #[serde(rename = "ВладелецФайла_Key")]
    pub owner_key: String,
}

/// Nomenclature type catalog entity
#[derive(Debug, Clone, Deserialize)]
pub struct NomenclatureTypeEntity {
    #[serde(rename = "Ref_Key")]
    pub ref_key: String,

    #[serde(rename = "Parent_Key")]
    pub parent_key: String,

    #[serde(rename = "IsFolder")]
    pub is_folder: bool,

    /// Display name
    #[serde(rename = "Description")]
    pub description: String,

    /// Long description text
    #[serde(rename = "Описание", default)]
    pub details: Option<String>,

    #[serde(rename = "DataVersion")]
    pub data_version: String,

    #[serde(rename = "DeletionMark")]
    pub deletion_mark: bool,
}

/// Manufacturer catalog entity; the fetch filters folders out server-side
#[derive(Debug, Clone, Deserialize)]
pub struct ManufacturerEntity {
    #[serde(rename = "Ref_Key")]
    pub ref_key: String,

    #[serde(rename = "IsFolder", default)]
    pub is_folder: bool,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "DataVersion")]
    pub data_version: String,

    #[serde(rename = "DeletionMark")]
    pub deletion_mark: bool,
}

/// Packaging/measurement unit catalog entity
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementUnitEntity {
    #[serde(rename = "Ref_Key")]
    pub ref_key: String,

    /// Owning nomenclature item
    #[serde(rename = "Owner")]
    pub owner: String,

    #[serde(rename = "Description")]
    pub description: String,

    /// Unit weight in kilograms
    #[serde(rename = "Вес")]
    pub weight: f64,

    #[serde(rename = "Числитель")]
    pub numerator: f64,

    #[serde(rename = "Знаменатель")]
    pub denominator: f64,

    #[serde(rename = "DataVersion")]
    pub data_version: String,

    #[serde(rename = "DeletionMark")]
    pub deletion_mark: bool,
}

/// Latest-slice row of the nomenclature price register
#[derive(Debug, Clone, Deserialize)]
pub struct PriceSliceEntity {
    /// Document reference that recorded the price
    #[serde(rename = "Recorder")]
    pub recorder: String,

    /// 1C datetime string, `YYYY-MM-DDTHH:MM:SS`
    #[serde(rename = "Period")]
    pub period: String,

    #[serde(rename = "Цена")]
    pub price: f64,

    #[serde(rename = "Упаковка_Key")]
    pub package_key: String,

    #[serde(rename = "Номенклатура_Key")]
    pub nomenclature_key: String,
}

/// Balance row of the free-stock accumulation register
#[derive(Debug, Clone, Deserialize)]
pub struct StockBalanceEntity {
    #[serde(rename = "Номенклатура_Key")]
    pub nomenclature_key: String,

    #[serde(rename = "ВНаличииBalance")]
    pub available: f64,

    #[serde(rename = "ВРезервеСоСкладаBalance")]
    pub reserved_stock: f64,

    #[serde(rename = "ВРезервеПодЗаказBalance")]
    pub reserved_orders: f64,
}

impl From<PropertyValueEntity> for PropertyValue {
    fn from(entity: PropertyValueEntity) -> Self {
        PropertyValue {
            property_id: entity.property_key,
            value: entity.value,
        }
    }
}

impl From<NomenclatureEntity> for NomenclatureRecord {
    fn from(entity: NomenclatureEntity) -> Self {
        NomenclatureRecord {
            id: entity.ref_key,
            parent_id: entity.parent_key,
            type_id: entity.nomenclature_type_key,
            is_folder: entity.is_folder,
            name: entity.description,
            code: entity.code,
            description: entity.details,
            unit_id: entity.unit_key,
            manufacturer_id: entity.manufacturer_key,
            use_weight: entity.use_weight,
            data_version: entity.data_version,
            deletion_mark: entity.deletion_mark,
            properties: entity
                .additional_properties
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

impl From<AttachedFileEntity> for AttachedFileRecord {
    fn from(entity: AttachedFileEntity) -> Self {
        AttachedFileRecord {
            id: entity.ref_key,
            owner_id: entity.owner_key,
            path: entity.file_path,
        }
    }
}

impl From<NomenclatureTypeEntity> for NomenclatureTypeRecord {
    fn from(entity: NomenclatureTypeEntity) -> Self {
        NomenclatureTypeRecord {
            id: entity.ref_key,
            parent_id: entity.parent_key,
            is_folder: entity.is_folder,
            name: entity.description,
            description: entity.details,
            data_version: entity.data_version,
            deletion_mark: entity.deletion_mark,
        }
    }
}

impl From<ManufacturerEntity> for ManufacturerRecord {
    fn from(entity: ManufacturerEntity) -> Self {
        ManufacturerRecord {
            id: entity.ref_key,
            name: entity.description,
            data_version: entity.data_version,
            deletion_mark: entity.deletion_mark,
        }
    }
}

impl From<MeasurementUnitEntity> for MeasurementUnitRecord {
    fn from(entity: MeasurementUnitEntity) -> Self {
        MeasurementUnitRecord {
            id: entity.ref_key,
            owner_id: entity.owner,
            name: entity.description,
            weight: entity.weight,
            numerator: entity.numerator,
            denominator: entity.denominator,
            data_version: entity.data_version,
            deletion_mark: entity.deletion_mark,
        }
    }
}

impl From<PriceSliceEntity> for PriceRecord {
    fn from(entity: PriceSliceEntity) -> Self {
        PriceRecord {
            nomenclature_id: entity.nomenclature_key,
            package_id: entity.package_key,
            price: entity.price,
            period: entity.period,
            recorder: entity.recorder,
        }
    }
}

impl From<StockBalanceEntity> for StockRecord {
    fn from(entity: StockBalanceEntity) -> Self {
        StockRecord {
            nomenclature_id: entity.nomenclature_key,
            available: entity.available,
            reserved_stock: entity.reserved_stock,
            reserved_orders: entity.reserved_orders,
        }
    }
}
