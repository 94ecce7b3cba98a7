//! 1C OData connector implementation
//!
//! Implements the [`CatalogSource`] trait against the standard OData
//! service of a 1C installation. Each fetch pulls the full snapshot for its
//! entity type; paths, filters, and orderings are fixed per type, register
//! fetches take the guid their server-side filter needs.

use async_trait::async_trait;
use tracing::{info, instrument};

use core_sync::source::{
    AttachedFileRecord, CatalogSource, ManufacturerRecord, MeasurementUnitRecord,
    NomenclatureRecord, NomenclatureTypeRecord, PriceRecord, SourceResult, StockRecord,
};

use crate::client::{ODataClient, ODataQuery};
use crate::types::{
    AttachedFileEntity, ManufacturerEntity, MeasurementUnitEntity, NomenclatureEntity,
    NomenclatureTypeEntity, PriceSliceEntity, StockBalanceEntity,
};

const NOMENCLATURE_PATH: &str = "Catalog_Номенклатура";
const NOMENCLATURE_FILES_PATH: &str = "Catalog_НоменклатураПрисоединенныеФайлы";
const NOMENCLATURE_TYPES_PATH: &str = "Catalog_ВидыНоменклатуры";
const MANUFACTURERS_PATH: &str = "Catalog_Производители";
const MEASUREMENT_UNITS_PATH: &str = "Catalog_УпаковкиЕдиницыИзмерения";
/// Latest-slice virtual table of the price register
const PRICES_PATH: &str = "InformationRegister_ЦеныНоменклатуры_RecordType/SliceLast";
/// Balance virtual table of the free-stock register, warehouse dimension
const STOCK_PATH: &str =
    "AccumulationRegister_СвободныеОстатки/Balance(Dimensions='Номенклатура,Склад')";

/// Fields to request per entity type
///
/// The additional-property sub-fields ride along in the nomenclature
/// `$select`; 1C delivers tabular sections without `$expand`.
const NOMENCLATURE_SELECT: &str = "Ref_Key,Parent_Key,IsFolder,ВидНоменклатуры_Key,Description,Code,Описание,ЕдиницаИзмерения_Key,Производитель_Key,ВесИспользовать,DataVersion,DeletionMark,ДополнительныеРеквизиты/Ref_Key,ДополнительныеРеквизиты/Значение,ДополнительныеРеквизиты/Свойство_Key";
const NOMENCLATURE_FILES_SELECT: &str = "Ref_Key,ПутьКФайлу,ВладелецФайла_Key";
const NOMENCLATURE_TYPES_SELECT: &str =
    "Ref_Key,DeletionMark,Parent_Key,IsFolder,Description,Описание,DataVersion";
const MANUFACTURERS_SELECT: &str = "Ref_Key,DataVersion,DeletionMark,IsFolder,Description";
const MEASUREMENT_UNITS_SELECT: &str =
    "Ref_Key,Description,DeletionMark,DataVersion,Owner,Вес,Числитель,Знаменатель";
const PRICES_SELECT: &str = "Recorder,Period,Цена,Упаковка_Key,Номенклатура_Key";
const STOCK_SELECT: &str =
    "ВНаличииBalance,ВРезервеСоСкладаBalance,ВРезервеПодЗаказBalance,Номенклатура_Key";

/// Catalog source backed by a 1C OData service
///
/// # Example
///
/// ```ignore
/// use provider_odata::{ODataCatalogSource, ODataClient, ReqwestTransport};
///
/// let transport = Arc::new(ReqwestTransport::new());
/// let client = ODataClient::new(transport, base_url, auth_header);
/// let source = ODataCatalogSource::new(client);
/// let items = source.fetch_nomenclature().await?;
/// ```
pub struct ODataCatalogSource {
    client: ODataClient,
}

impl ODataCatalogSource {
    pub fn new(client: ODataClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CatalogSource for ODataCatalogSource {
    #[instrument(skip(self))]
    async fn fetch_nomenclature(&self) -> SourceResult<Vec<NomenclatureRecord>> {
        info!("Fetching nomenclature snapshot");

        let query = ODataQuery::new()
            .filter("DeletionMark eq false")
            .select(NOMENCLATURE_SELECT)
            .order_by("IsFolder desc");
        let entities: Vec<NomenclatureEntity> =
            self.client.fetch(NOMENCLATURE_PATH, query).await?;

        info!("Fetched {} nomenclature items", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_nomenclature_files(&self) -> SourceResult<Vec<AttachedFileRecord>> {
        info!("Fetching nomenclature file attachments");

        let query = ODataQuery::new()
            .filter("DeletionMark eq false")
            .select(NOMENCLATURE_FILES_SELECT);
        let entities: Vec<AttachedFileEntity> =
            self.client.fetch(NOMENCLATURE_FILES_PATH, query).await?;

        info!("Fetched {} nomenclature files", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_nomenclature_types(&self) -> SourceResult<Vec<NomenclatureTypeRecord>> {
        info!("Fetching nomenclature type snapshot");

        // No deletion filter: marked types still need their mark mirrored
        let query = ODataQuery::new()
            .select(NOMENCLATURE_TYPES_SELECT)
            .order_by("IsFolder desc");
        let entities: Vec<NomenclatureTypeEntity> =
            self.client.fetch(NOMENCLATURE_TYPES_PATH, query).await?;

        info!("Fetched {} nomenclature types", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_manufacturers(&self) -> SourceResult<Vec<ManufacturerRecord>> {
        info!("Fetching manufacturer snapshot");

        let query = ODataQuery::new()
            .filter("IsFolder eq false")
            .select(MANUFACTURERS_SELECT);
        let entities: Vec<ManufacturerEntity> =
            self.client.fetch(MANUFACTURERS_PATH, query).await?;

        info!("Fetched {} manufacturers", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_measurement_units(&self) -> SourceResult<Vec<MeasurementUnitRecord>> {
        info!("Fetching measurement unit snapshot");

        let query = ODataQuery::new().select(MEASUREMENT_UNITS_SELECT);
        let entities: Vec<MeasurementUnitEntity> =
            self.client.fetch(MEASUREMENT_UNITS_PATH, query).await?;

        info!("Fetched {} measurement units", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(price_type_id = %price_type_id))]
    async fn fetch_prices(&self, price_type_id: &str) -> SourceResult<Vec<PriceRecord>> {
        info!("Fetching price slice");

        let query = ODataQuery::new()
            .filter(format!("ВидЦены_Key eq guid'{}'", price_type_id))
            .select(PRICES_SELECT);
        let entities: Vec<PriceSliceEntity> = self.client.fetch(PRICES_PATH, query).await?;

        info!("Fetched {} price rows", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(warehouse_id = %warehouse_id))]
    async fn fetch_stock(&self, warehouse_id: &str) -> SourceResult<Vec<StockRecord>> {
        info!("Fetching stock balances");

        let query = ODataQuery::new()
            .filter(format!("Склад_Key eq guid'{}'", warehouse_id))
            .select(STOCK_SELECT);
        let entities: Vec<StockBalanceEntity> = self.client.fetch(STOCK_PATH, query).await?;

        info!("Fetched {} stock rows", entities.len());
        Ok(entities.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpResponse, HttpTransport};
    use core_sync::source::{PropertyScalar, SourceError};
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        Transport {}

        #[async_trait]
        impl HttpTransport for Transport {
            async fn get(
                &self,
                url: String,
                headers: Vec<(String, String)>,
            ) -> crate::error::Result<HttpResponse>;
        }
    }

    fn source_with(transport: MockTransport) -> ODataCatalogSource {
        let client = ODataClient::new(
            Arc::new(transport),
            "https://erp.example/odata/standard.odata",
            "Basic dXNlcjpwYXNz",
        );
        ODataCatalogSource::new(client)
    }

    fn ok_body(body: &str) -> crate::error::Result<HttpResponse> {
        Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        })
    }

    #[tokio::test]
    async fn test_fetch_nomenclature_builds_query_and_converts() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.starts_with(
                "https://erp.example/odata/standard.odata/Catalog_Номенклатура?$format=json"
            ));
            assert!(url.contains("&$filter=DeletionMark eq false"));
            assert!(url.contains("&$select=Ref_Key,Parent_Key,IsFolder,ВидНоменклатуры_Key"));
            assert!(url.contains("ДополнительныеРеквизиты/Свойство_Key"));
            assert!(url.ends_with("&$orderby=IsFolder desc"));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Ref_Key": "item-1",
                            "Parent_Key": "00000000-0000-0000-0000-000000000000",
                            "IsFolder": false,
                            "ВидНоменклатуры_Key": "type-1",
                            "Description": "Сыр Гауда",
                            "Code": "00-00001234",
                            "Описание": null,
                            "ЕдиницаИзмерения_Key": "unit-1",
                            "Производитель_Key": "maker-1",
                            "ВесИспользовать": true,
                            "DataVersion": "AAACAgA=",
                            "DeletionMark": false,
                            "ДополнительныеРеквизиты": [
                                {
                                    "Ref_Key": "item-1",
                                    "Значение": "0,25",
                                    "Свойство_Key": "prop-weight"
                                }
                            ]
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source.fetch_nomenclature().await.unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "item-1");
        assert_eq!(record.name, "Сыр Гауда");
        assert_eq!(record.description, None);
        assert!(record.use_weight);
        assert_eq!(record.properties.len(), 1);
        assert_eq!(record.properties[0].property_id, "prop-weight");
        assert_eq!(
            record.properties[0].value,
            PropertyScalar::Text("0,25".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_nomenclature_types_has_no_filter() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.contains("Catalog_ВидыНоменклатуры?$format=json&$select="));
            assert!(!url.contains("$filter"));
            assert!(url.ends_with("&$orderby=IsFolder desc"));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Ref_Key": "type-1",
                            "Parent_Key": "00000000-0000-0000-0000-000000000000",
                            "IsFolder": true,
                            "Description": "Молочная продукция",
                            "Описание": null,
                            "DataVersion": "AAE=",
                            "DeletionMark": true
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source.fetch_nomenclature_types().await.unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0].is_folder);
        assert!(records[0].deletion_mark);
    }

    #[tokio::test]
    async fn test_fetch_manufacturers_excludes_folders_server_side() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.contains("Catalog_Производители?$format=json&$filter=IsFolder eq false"));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Ref_Key": "maker-1",
                            "IsFolder": false,
                            "Description": "Завод Рассвет",
                            "DataVersion": "AAE=",
                            "DeletionMark": false
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source.fetch_manufacturers().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Завод Рассвет");
    }

    #[tokio::test]
    async fn test_fetch_prices_filters_by_price_type_guid() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.contains(
                "InformationRegister_ЦеныНоменклатуры_RecordType/SliceLast?$format=json"
            ));
            assert!(url.contains(
                "&$filter=ВидЦены_Key eq guid'1de3a6ed-0000-0000-0000-000000000001'"
            ));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Recorder": "doc-1",
                            "Period": "2024-05-01T00:00:00",
                            "Цена": 199.9,
                            "Упаковка_Key": "pkg-1",
                            "Номенклатура_Key": "item-1"
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source
            .fetch_prices("1de3a6ed-0000-0000-0000-000000000001")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].nomenclature_id, "item-1");
        assert_eq!(records[0].price, 199.9);
    }

    #[tokio::test]
    async fn test_fetch_stock_uses_balance_dimensions_verbatim() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.contains(
                "AccumulationRegister_СвободныеОстатки/Balance(Dimensions='Номенклатура,Склад')"
            ));
            assert!(url.contains(
                "&$filter=Склад_Key eq guid'77000000-0000-0000-0000-000000000001'"
            ));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Номенклатура_Key": "item-1",
                            "ВНаличииBalance": 12.0,
                            "ВРезервеСоСкладаBalance": 2.0,
                            "ВРезервеПодЗаказBalance": 1.0
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source
            .fetch_stock("77000000-0000-0000-0000-000000000001")
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].available, 12.0);
        assert_eq!(records[0].reserved_stock, 2.0);
        assert_eq!(records[0].reserved_orders, 1.0);
    }

    #[tokio::test]
    async fn test_fetch_measurement_units_converts_owner() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.contains("Catalog_УпаковкиЕдиницыИзмерения?$format=json&$select="));
            assert!(url.contains("Owner,Вес,Числитель,Знаменатель"));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Ref_Key": "unit-1",
                            "Owner": "item-1",
                            "Description": "кг",
                            "Вес": 1,
                            "Числитель": 1,
                            "Знаменатель": 1,
                            "DataVersion": "AAE=",
                            "DeletionMark": false
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source.fetch_measurement_units().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].owner_id, "item-1");
        assert_eq!(records[0].weight, 1.0);
    }

    #[tokio::test]
    async fn test_fetch_files_keeps_raw_paths() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|url, _| {
            assert!(url.contains("Catalog_НоменклатураПрисоединенныеФайлы?$format=json"));
            assert!(url.contains("&$filter=DeletionMark eq false"));

            ok_body(
                r#"{
                    "odata.metadata": "meta",
                    "value": [
                        {
                            "Ref_Key": "f-1",
                            "ПутьКФайлу": "Файлы\\Номенклатура\\cheese.png",
                            "ВладелецФайла_Key": "item-1"
                        }
                    ]
                }"#,
            )
        });

        let source = source_with(transport);
        let records = source.fetch_nomenclature_files().await.unwrap();

        assert_eq!(records.len(), 1);
        // Separator rewrite happens during normalization, not here
        assert_eq!(records[0].path, "Файлы\\Номенклатура\\cheese.png");
    }

    #[tokio::test]
    async fn test_rejection_maps_to_source_error() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|_, _| {
            ok_body(
                r#"{
                    "odata.error": {
                        "code": "30",
                        "message": {
                            "lang": "ru",
                            "value": "Недостаточно прав для выполнения операции"
                        }
                    }
                }"#,
            )
        });

        let source = source_with(transport);
        let result = source.fetch_manufacturers().await;

        match result {
            Err(SourceError::Rejected { code, message }) => {
                assert_eq!(code, "30");
                assert_eq!(message, "Недостаточно прав для выполнения операции");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_maps_to_request_error() {
        let mut transport = MockTransport::new();
        transport.expect_get().times(1).returning(|_, _| {
            Ok(HttpResponse {
                status: 404,
                body: b"Not found".to_vec(),
            })
        });

        let source = source_with(transport);
        let result = source.fetch_nomenclature().await;

        assert!(matches!(result, Err(SourceError::Request(_))));
    }
}
