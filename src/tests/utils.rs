use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::domain::auction::{AuctionStatus, ListingSummary};
use crate::scraper::{Fetch, ScraperError};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn unique_suffix(name: &str) -> String {
    format!(
        "{name}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

/// Returns a fresh test database using the production schema
pub fn make_db(name: &str) -> Database {
    let path = std::env::temp_dir().join(format!("{}.sqlite", unique_suffix(name)));
    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db).expect("Failed to initialize DB");
    db
}

pub fn temp_export_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(unique_suffix(name))
        .join("api")
        .join("auctions.json")
}

/// Config with every pacing delay at zero.
pub fn test_config(db: &Database, name: &str) -> Config {
    Config {
        database_path: db.path().to_string(),
        export_path: temp_export_path(name),
        partition_delay: Duration::ZERO,
        enrich_delay: Duration::ZERO,
        geocode_delay: Duration::ZERO,
        geocode_error_cooldown: Duration::ZERO,
        ..Config::default()
    }
}

pub fn summary(id: &str, detail_line: &str) -> ListingSummary {
    ListingSummary {
        id: id.to_string(),
        title: format!("Subasta {id}"),
        court: "JUZGADO DE PRIMERA INSTANCIA N 1".to_string(),
        status: AuctionStatus::Upcoming,
        detail_line: detail_line.to_string(),
        amount: Some(90000.0),
        url: format!("https://subastas.boe.es/detalleSubasta.php?idSub={id}"),
        city: String::new(),
        province: String::new(),
    }
}

type Handler = Box<dyn Fn(&str, &[(&str, String)]) -> Result<String, ScraperError>>;

/// In-memory `Fetch` answering from a closure and recording every call.
pub struct FakeFetcher {
    handler: Handler,
    calls: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new<H>(handler: H) -> Self
    where
        H: Fn(&str, &[(&str, String)]) -> Result<String, ScraperError> + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, method: &str, url: &str, params: &[(&str, String)]) {
        let params: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.calls
            .borrow_mut()
            .push(format!("{method} {url} {}", params.join("&")));
    }
}

impl Fetch for FakeFetcher {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, ScraperError> {
        self.record("GET", url, query);
        (self.handler)(url, query)
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, ScraperError> {
        self.record("POST", url, form);
        (self.handler)(url, form)
    }
}

pub fn param<'a>(params: &'a [(&str, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

pub const NO_RESULTS_HTML: &str =
    "<html><body><div>No se han encontrado documentos que satisfagan sus criterios de búsqueda.</div></body></html>";

pub const SEVILLA_RESULTS_HTML: &str = r#"
    <html><body><ul>
      <li class="resultado-busqueda">
        <h3>Subasta SUB-JA-2026-250001</h3>
        <h4>JUZGADO DE PRIMERA INSTANCIA N 3 DE SEVILLA</h4>
        <p>Estado: Celebrándose - [Conclusión prevista: 20/11/2026]</p>
        <p>SEVILLA (SEVILLA)</p>
        <a href="./detalleSubasta.php?idSub=SUB-JA-2026-250001&amp;ver=1">Más...</a>
      </li>
    </ul></body></html>
"#;

pub const GENERAL_VIEW_HTML: &str = r#"
    <html><body><table>
      <tr><th>Identificador</th><td>SUB-JA-2026-250001</td></tr>
      <tr><th>Tipo de subasta</th><td>JUDICIAL EN VIA DE APREMIO</td></tr>
      <tr><th>Cantidad reclamada</th><td>150.320,11 €</td></tr>
      <tr><th>Tasación</th><td>210.000,00 €</td></tr>
      <tr><th>Puja mínima</th><td>Sin puja mínima</td></tr>
      <tr><th>Importe del depósito</th><td>10.500,00 €</td></tr>
    </table></body></html>
"#;

pub const ASSETS_VIEW_HTML: &str = r#"
    <html><body><table>
      <tr><th>Descripción</th><td>VIVIENDA</td></tr>
      <tr><th>Referencia catastral</th><td>9872023VH5797S0001WX</td></tr>
      <tr><th>Dirección</th><td>CALLE FERIA 12</td></tr>
      <tr><th>Código Postal</th><td>41003</td></tr>
      <tr><th>Localidad</th><td>SEVILLA</td></tr>
      <tr><th>Visitable</th><td>No consta</td></tr>
      <tr><th>Situación posesoria</th><td>No consta</td></tr>
    </table></body></html>
"#;
