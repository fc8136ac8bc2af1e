// client.rs
use crate::scraper::ScraperError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

/// Outbound HTTP used by the pipeline stages. Bodies come back as text.
pub trait Fetch {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, ScraperError>;

    /// POST `form` as `application/x-www-form-urlencoded`.
    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, ScraperError>;
}

/// Blocking reqwest client carrying the identity header the remote side expects.
/// Timeouts are the client defaults.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: &str) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        Ok(Self { client })
    }

    fn read_body(resp: reqwest::blocking::Response) -> Result<String, ScraperError> {
        let status = resp.status();
        let url = resp.url().to_string();

        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(resp.text()?)
    }
}

impl Fetch for HttpClient {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, ScraperError> {
        let resp = self.client.get(url).query(query).send()?;
        Self::read_body(resp)
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, ScraperError> {
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .form(form)
            .send()?;
        Self::read_body(resp)
    }
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<String, ScraperError> {
        (**self).get(url, query)
    }

    fn post_form(&self, url: &str, form: &[(&str, String)]) -> Result<String, ScraperError> {
        (**self).post_form(url, form)
    }
}
