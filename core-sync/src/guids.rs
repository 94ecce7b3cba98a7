//! Validated guid constants resolved from the stored settings document
//!
//! The settings document stores every guid as optional; syncs that depend
//! on guid resolution (nomenclature, prices, stock) validate the complete
//! contract up front so a half-configured site fails before any fetch.

use core_catalog::models::SiteSettings;

use crate::error::{Result, SyncError};

/// The guid constants a sync run resolves records against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncGuids {
    /// Warehouse dimension for the stock balance query
    pub warehouse: String,
    /// Price type for the price slice query
    pub default_price_type: String,
    /// Measurement unit meaning "kilogram"
    pub kilogram_unit: String,
    /// Measurement unit meaning "piece"
    pub piece_unit: String,
    /// Additional property holding the minimum non-divisible weight
    pub minimum_weight_property: String,
    /// Additional property holding storefront visibility
    pub show_on_website_property: String,
}

fn required(value: &Option<String>, path: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(SyncError::MissingGuid { path }),
    }
}

fn present(value: &Option<String>, path: &'static str) -> Result<()> {
    required(value, path).map(|_| ())
}

impl SyncGuids {
    /// Validate `settings` against the full guid contract
    ///
    /// Every guid in the contract must be present and non-empty, including
    /// the user-directory guids the engine itself never queries; a site
    /// missing any of them is misconfigured for sync as a whole. The
    /// error names the first missing path.
    pub fn from_settings(settings: &SiteSettings) -> Result<Self> {
        let guids = settings
            .guids_for_sync
            .as_ref()
            .ok_or(SyncError::MissingGuid {
                path: "guidsForSync",
            })?;

        let units = guids.units.as_ref().ok_or(SyncError::MissingGuid {
            path: "guidsForSync.units",
        })?;
        let nomenclature = guids.nomenclature.as_ref().ok_or(SyncError::MissingGuid {
            path: "guidsForSync.nomenclature",
        })?;
        let user = guids.user.as_ref().ok_or(SyncError::MissingGuid {
            path: "guidsForSync.user",
        })?;

        present(&user.show_on_website, "guidsForSync.user.showOnWebsite")?;
        present(&user.site_password, "guidsForSync.user.sitePassword")?;
        present(&user.site_role, "guidsForSync.user.siteRole")?;
        present(&user.role_admin_value, "guidsForSync.user.roleAdminValue")?;
        present(
            &user.role_employee_value,
            "guidsForSync.user.roleEmployeeValue",
        )?;

        Ok(Self {
            warehouse: required(&guids.warehouse, "guidsForSync.warehouse")?,
            default_price_type: required(
                &guids.default_price_type,
                "guidsForSync.defaultPriceType",
            )?,
            kilogram_unit: required(&units.kilogram, "guidsForSync.units.kilogram")?,
            piece_unit: required(&units.piece, "guidsForSync.units.piece")?,
            minimum_weight_property: required(
                &nomenclature.minimum_weight,
                "guidsForSync.nomenclature.minimumWeight",
            )?,
            show_on_website_property: required(
                &nomenclature.show_on_website,
                "guidsForSync.nomenclature.showOnWebsite",
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_catalog::models::{GuidsForSync, NomenclatureGuids, UnitGuids, UserGuids};

    fn complete_settings() -> SiteSettings {
        SiteSettings {
            guids_for_sync: Some(GuidsForSync {
                warehouse: Some("wh".to_string()),
                default_price_type: Some("pt".to_string()),
                units: Some(UnitGuids {
                    kilogram: Some("kg".to_string()),
                    piece: Some("pc".to_string()),
                }),
                nomenclature: Some(NomenclatureGuids {
                    minimum_weight: Some("mw".to_string()),
                    show_on_website: Some("sw".to_string()),
                }),
                user: Some(UserGuids {
                    show_on_website: Some("u1".to_string()),
                    site_password: Some("u2".to_string()),
                    site_role: Some("u3".to_string()),
                    role_admin_value: Some("u4".to_string()),
                    role_employee_value: Some("u5".to_string()),
                }),
            }),
        }
    }

    #[test]
    fn test_complete_settings_resolve() {
        let guids = SyncGuids::from_settings(&complete_settings()).unwrap();

        assert_eq!(guids.warehouse, "wh");
        assert_eq!(guids.default_price_type, "pt");
        assert_eq!(guids.kilogram_unit, "kg");
        assert_eq!(guids.piece_unit, "pc");
        assert_eq!(guids.minimum_weight_property, "mw");
        assert_eq!(guids.show_on_website_property, "sw");
    }

    #[test]
    fn test_missing_section_names_path() {
        let result = SyncGuids::from_settings(&SiteSettings::default());
        assert!(matches!(
            result,
            Err(SyncError::MissingGuid {
                path: "guidsForSync"
            })
        ));
    }

    #[test]
    fn test_missing_leaf_names_path() {
        let mut settings = complete_settings();
        if let Some(guids) = settings.guids_for_sync.as_mut() {
            if let Some(units) = guids.units.as_mut() {
                units.kilogram = None;
            }
        }

        let result = SyncGuids::from_settings(&settings);
        assert!(matches!(
            result,
            Err(SyncError::MissingGuid {
                path: "guidsForSync.units.kilogram"
            })
        ));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut settings = complete_settings();
        if let Some(guids) = settings.guids_for_sync.as_mut() {
            guids.warehouse = Some("   ".to_string());
        }

        let result = SyncGuids::from_settings(&settings);
        assert!(matches!(
            result,
            Err(SyncError::MissingGuid {
                path: "guidsForSync.warehouse"
            })
        ));
    }

    #[test]
    fn test_user_guids_are_part_of_the_contract() {
        let mut settings = complete_settings();
        if let Some(guids) = settings.guids_for_sync.as_mut() {
            if let Some(user) = guids.user.as_mut() {
                user.site_role = None;
            }
        }

        let result = SyncGuids::from_settings(&settings);
        assert!(matches!(
            result,
            Err(SyncError::MissingGuid {
                path: "guidsForSync.user.siteRole"
            })
        ));
    }
}
