// models.rs

/// Base for resolving the relative links found on result pages.
pub const BOE_BASE_URL: &str = "https://subastas.boe.es";
pub const BOE_SEARCH_URL: &str = "https://subastas.boe.es/subastas_ava.php";

/// Case stage "EJ" (ejecución).
pub const CASE_STAGE_EXECUTION: &str = "EJ";
/// Asset type "I" (inmueble, real estate).
pub const ASSET_TYPE_REAL_ESTATE: &str = "I";
pub const PAGE_HITS: u32 = 500;

/// Number of province codes used to partition the search (`01`..`52`).
pub const PROVINCE_COUNT: u32 = 52;

/// Query parameter selecting one of the secondary views of a listing.
pub const VIEW_PARAM: &str = "ver";
pub const VIEW_GENERAL: &str = "1";
pub const VIEW_ASSETS: &str = "3";

/// The BOE advanced-search form. `campo[n]` names the filtered column and
/// `dato[n]` carries its value.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub case_stage: String,
    pub asset_type: String,
    pub province: String,
    pub page_hits: u32,
}

impl SearchRequest {
    pub fn for_province(province: &str) -> Self {
        Self {
            case_stage: CASE_STAGE_EXECUTION.to_string(),
            asset_type: ASSET_TYPE_REAL_ESTATE.to_string(),
            province: province.to_string(),
            page_hits: PAGE_HITS,
        }
    }

    pub fn to_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("campo[2]", "SUBASTA.ESTADO.CODIGO".to_string()),
            ("dato[2]", self.case_stage.clone()),
            ("campo[3]", "BIEN.TIPO".to_string()),
            ("dato[3]", self.asset_type.clone()),
            ("campo[8]", "BIEN.COD_PROVINCIA".to_string()),
            ("dato[8]", self.province.clone()),
            ("page_hits", self.page_hits.to_string()),
            ("accion", "Buscar".to_string()),
        ]
    }
}

/// Province codes `01` through `52`, zero padded.
pub fn province_codes() -> Vec<String> {
    (1..=PROVINCE_COUNT).map(|n| format!("{n:02}")).collect()
}
