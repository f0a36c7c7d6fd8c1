// src/storage/sheets_store.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::{RecordStore, TableHandle, TableRef};
use crate::types::TableKind;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const TOKEN_LIFETIME_SECS: i64 = 3600;
// Refresh a little before Google expires the token
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const NEW_SHEET_ROWS: u32 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct TokenClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Worksheets inside one Google spreadsheet, authenticated as a service account
pub struct SheetsStore {
    client: Client,
    spreadsheet_id: String,
    key: ServiceAccountKey,
    api_url: String,
    token: Mutex<Option<CachedToken>>,
}

impl SheetsStore {
    pub fn new(spreadsheet_id: String, key: ServiceAccountKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            spreadsheet_id,
            key,
            api_url: SHEETS_API_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn from_credentials_file(spreadsheet_id: String, credentials_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(credentials_path).with_context(|| {
            format!(
                "Failed to read service account credentials: {}",
                credentials_path.display()
            )
        })?;
        let key: ServiceAccountKey =
            serde_json::from_str(&content).context("Failed to parse service account credentials")?;

        Self::new(spreadsheet_id, key)
    }

    /// Point the store at another Sheets API root
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    pub fn with_token_uri(mut self, token_uri: String) -> Self {
        self.key.token_uri = token_uri;
        self
    }

    fn signed_assertion(&self, now: i64) -> Result<String> {
        let claims = TokenClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let encoding_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .context("Invalid service account private key")?;

        encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .context("Failed to sign service account assertion")
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + TOKEN_REFRESH_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let assertion = self.signed_assertion(chrono::Utc::now().timestamp())?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .context("Failed to request access token")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed {}: {}", status, error_text);
            anyhow::bail!("Token exchange failed with status {}: {}", status, error_text);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse access token response")?;

        let lifetime = token.expires_in.unwrap_or(TOKEN_LIFETIME_SECS as u64);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        info!("Obtained Sheets access token for {}", self.key.client_email);

        Ok(token.access_token)
    }

    /// `{api}/{id}/<segments...>`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_url).context("Invalid Sheets API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Sheets API URL cannot be a base"))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("Failed to {}", action))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Sheets API error while trying to {}: {}", action, error_text);
            anyhow::bail!(
                "Sheets API returned {} while trying to {}: {}",
                status,
                action,
                error_text
            )
        }
    }

    async fn worksheet_titles(&self) -> Result<Vec<String>> {
        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");

        let metadata: SpreadsheetMetadata = self
            .send(self.client.get(url), "read spreadsheet metadata")
            .await?
            .json()
            .await
            .context("Failed to parse spreadsheet metadata")?;

        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn add_worksheet(&self, title: &str, columns: u32) -> Result<()> {
        let url = self.endpoint(&[])?;
        // `:batchUpdate` is a suffix on the id segment, not a new segment
        let url = Url::parse(&format!("{}:batchUpdate", url)).context("Invalid batchUpdate URL")?;

        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": NEW_SHEET_ROWS, "columnCount": columns }
                    }
                }
            }]
        });

        self.send(self.client.post(url).json(&body), "add worksheet")
            .await?;
        info!("Created worksheet {}", title);
        Ok(())
    }

    async fn first_row(&self, title: &str) -> Result<Vec<Value>> {
        let url = self.endpoint(&["values", &format!("{}!1:1", sheet_range(title))])?;

        let range: ValueRange = self
            .send(self.client.get(url), "read header row")
            .await?
            .json()
            .await
            .context("Failed to parse header row")?;

        Ok(range.values.into_iter().next().unwrap_or_default())
    }
}

/// A1 range covering a whole worksheet, with the title quoted
pub fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_header_row(row: &[String], headers: &[String]) -> bool {
    row.len() >= headers.len() && row.iter().zip(headers).all(|(cell, h)| cell.trim() == h)
}

/// Drop the header row and pad rows the API returned without trailing empty cells.
/// A first row that is not the header is kept as data.
pub fn normalize_rows(values: Vec<Vec<Value>>, headers: &[String]) -> Vec<Vec<String>> {
    let width = headers.len();
    let mut rows: Vec<Vec<String>> = values
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(cell_text).collect();
            if cells.len() < width {
                cells.resize(width, String::new());
            }
            cells
        })
        .collect();

    if rows.first().is_some_and(|row| is_header_row(row, headers)) {
        rows.remove(0);
    }
    rows
}

#[async_trait]
impl RecordStore for SheetsStore {
    fn backend_name(&self) -> &'static str {
        "sheets"
    }

    async fn ensure_table(&self, table: &TableRef, headers: &[&str]) -> Result<TableHandle> {
        let title = table.worksheet_title();
        let handle = TableHandle::new(title.clone(), headers);

        if !self.worksheet_titles().await?.contains(&title) {
            let columns = match table.kind {
                TableKind::Jobs => 20,
                TableKind::Contacts => 10,
            };
            self.add_worksheet(&title, columns).await?;
            self.append_row(&handle, handle.headers.clone()).await?;
        } else if self.first_row(&title).await?.is_empty() {
            // Left behind when the header write failed after the sheet was added
            warn!("Worksheet {} has no header row, writing it", title);
            self.append_row(&handle, handle.headers.clone()).await?;
        }

        Ok(handle)
    }

    async fn append_row(&self, handle: &TableHandle, row: Vec<String>) -> Result<()> {
        let mut url = self.endpoint(&["values", &format!("{}:append", sheet_range(&handle.name))])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = json!({ "values": [row] });
        self.send(self.client.post(url).json(&body), "append row")
            .await?;
        Ok(())
    }

    async fn read_rows(&self, handle: &TableHandle) -> Result<Vec<Vec<String>>> {
        let url = self.endpoint(&["values", &sheet_range(&handle.name)])?;

        let range: ValueRange = self
            .send(self.client.get(url), "read worksheet")
            .await?
            .json()
            .await
            .context("Failed to parse worksheet values")?;

        Ok(normalize_rows(range.values, &handle.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{append, ensure_table, read_all};
    use crate::types::records::parse_timestamp;
    use crate::types::{ContactRecord, JobRecord, CONTACT_HEADERS, JOB_HEADERS};
    use rocket::fairing::AdHoc;
    use rocket::form::{Form, FromForm};
    use rocket::http::Status;
    use rocket::request::{FromRequest, Outcome};
    use rocket::serde::json::Json;
    use rocket::{get, post, routes, Request, State};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    const TEST_KEY: &str = include_str!("../../tests/fixtures/test_service_account_key.pem");
    const STUB_TOKEN: &str = "stub-token";

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|h| h.to_string()).collect()
    }

    fn store() -> SheetsStore {
        SheetsStore::new(
            "sheet-id".to_string(),
            ServiceAccountKey {
                client_email: "tracker@project.iam.gserviceaccount.com".to_string(),
                private_key: "not a key".to_string(),
                token_uri: default_token_uri(),
            },
        )
        .unwrap()
    }

    /// In-memory spreadsheet speaking the subset of the Sheets API the store uses
    #[derive(Default)]
    struct StubSpreadsheet {
        sheets: std::sync::Mutex<Vec<(String, Vec<Vec<String>>)>>,
        token_requests: AtomicUsize,
    }

    impl StubSpreadsheet {
        fn rows(&self, title: &str) -> Option<Vec<Vec<String>>> {
            let sheets = self.sheets.lock().unwrap();
            sheets
                .iter()
                .find(|(t, _)| t == title)
                .map(|(_, rows)| rows.clone())
        }
    }

    /// `'title'`, `'title'!1:1` or `'title':append`
    fn split_range(range: &str) -> (String, &str) {
        let quoted = range.strip_prefix('\'').unwrap_or(range);
        match quoted.find('\'') {
            Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
            None => (quoted.to_string(), ""),
        }
    }

    struct Bearer;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for Bearer {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let expected = format!("Bearer {}", STUB_TOKEN);
            match req.headers().get_one("Authorization") {
                Some(value) if value == expected => Outcome::Success(Bearer),
                _ => Outcome::Error((Status::Unauthorized, ())),
            }
        }
    }

    #[derive(FromForm)]
    struct TokenForm {
        grant_type: String,
        assertion: String,
    }

    #[post("/token", data = "<form>")]
    fn token(
        form: Form<TokenForm>,
        stub: &State<Arc<StubSpreadsheet>>,
    ) -> Result<Json<Value>, Status> {
        let signed = form.assertion.split('.').count() == 3;
        if form.grant_type != "urn:ietf:params:oauth:grant-type:jwt-bearer" || !signed {
            return Err(Status::BadRequest);
        }
        stub.token_requests.fetch_add(1, Ordering::SeqCst);
        Ok(Json(json!({ "access_token": STUB_TOKEN, "expires_in": 3600 })))
    }

    #[get("/v4/spreadsheets/<_id>")]
    fn metadata(_id: &str, _auth: Bearer, stub: &State<Arc<StubSpreadsheet>>) -> Json<Value> {
        let sheets = stub.sheets.lock().unwrap();
        let entries: Vec<Value> = sheets
            .iter()
            .map(|(title, _)| json!({ "properties": { "title": title } }))
            .collect();
        Json(json!({ "sheets": entries }))
    }

    #[post("/v4/spreadsheets/<id>", data = "<body>")]
    fn batch_update(
        id: &str,
        body: Json<Value>,
        _auth: Bearer,
        stub: &State<Arc<StubSpreadsheet>>,
    ) -> Result<Json<Value>, Status> {
        if id != "sheet-id:batchUpdate" {
            return Err(Status::NotFound);
        }
        let title = body["requests"][0]["addSheet"]["properties"]["title"]
            .as_str()
            .ok_or(Status::BadRequest)?;
        stub.sheets
            .lock()
            .unwrap()
            .push((title.to_string(), Vec::new()));
        Ok(Json(json!({ "replies": [{}] })))
    }

    #[post("/v4/spreadsheets/<_id>/values/<range>", data = "<body>")]
    fn append_values(
        _id: &str,
        range: String,
        body: Json<Value>,
        _auth: Bearer,
        stub: &State<Arc<StubSpreadsheet>>,
    ) -> Result<Json<Value>, Status> {
        let (title, suffix) = split_range(&range);
        if suffix != ":append" {
            return Err(Status::NotFound);
        }
        let rows = body["values"].as_array().ok_or(Status::BadRequest)?;

        let mut sheets = stub.sheets.lock().unwrap();
        let (_, stored) = sheets
            .iter_mut()
            .find(|(t, _)| *t == title)
            .ok_or(Status::BadRequest)?;
        for row in rows {
            let cells = row.as_array().ok_or(Status::BadRequest)?;
            stored.push(cells.iter().map(cell_text).collect());
        }
        Ok(Json(json!({ "updates": { "updatedRows": rows.len() } })))
    }

    #[get("/v4/spreadsheets/<_id>/values/<range>")]
    fn read_values(
        _id: &str,
        range: String,
        _auth: Bearer,
        stub: &State<Arc<StubSpreadsheet>>,
    ) -> Result<Json<Value>, Status> {
        let (title, suffix) = split_range(&range);
        let mut rows = stub.rows(&title).ok_or(Status::BadRequest)?;
        if suffix == "!1:1" {
            rows.truncate(1);
        }
        if rows.is_empty() {
            return Ok(Json(json!({ "range": range })));
        }

        // The real API omits trailing empty cells
        let values: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut row| {
                while row.last().is_some_and(|cell| cell.is_empty()) {
                    row.pop();
                }
                row
            })
            .collect();
        Ok(Json(json!({ "range": range, "values": values })))
    }

    async fn spawn_stub(stub: Arc<StubSpreadsheet>) -> String {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .unwrap()
            .port();
        let ready = Arc::new(Notify::new());
        let signal = ready.clone();

        let figment = rocket::Config::figment()
            .merge(("address", "127.0.0.1"))
            .merge(("port", port))
            .merge(("log_level", "off"));
        let server = rocket::custom(figment)
            .manage(stub)
            .mount(
                "/",
                routes![token, metadata, batch_update, append_values, read_values],
            )
            .attach(AdHoc::on_liftoff("Stub ready", move |_| {
                Box::pin(async move { signal.notify_one() })
            }));

        tokio::spawn(server.launch());
        ready.notified().await;
        format!("http://127.0.0.1:{}", port)
    }

    fn stub_store(base: &str) -> SheetsStore {
        let key = ServiceAccountKey {
            client_email: "tracker@project.iam.gserviceaccount.com".to_string(),
            private_key: TEST_KEY.to_string(),
            token_uri: default_token_uri(),
        };
        SheetsStore::new("sheet-id".to_string(), key)
            .unwrap()
            .with_api_url(format!("{}/v4/spreadsheets", base))
            .with_token_uri(format!("{}/token", base))
    }

    fn job(n: u32, summary: &str) -> JobRecord {
        JobRecord {
            timestamp: parse_timestamp(&format!("2024-05-{:02} 09:30:00", n + 1)).unwrap(),
            job_link: format!("https://jobs.example.com/{}", n),
            company: format!("Company {}", n),
            job_description: "Backend work,\nremote".to_string(),
            top_skills: "Rust, SQL".to_string(),
            skills_summary: summary.to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_worksheet_round_trip() {
        let stub = Arc::new(StubSpreadsheet::default());
        let base = spawn_stub(stub.clone()).await;
        let store = stub_store(&base);

        let handle = ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        assert_eq!(handle.name, "missy");
        assert_eq!(stub.rows("missy").unwrap(), vec![headers(&JOB_HEADERS)]);

        let again = ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        assert_eq!(again, handle);
        assert_eq!(stub.rows("missy").unwrap().len(), 1);

        // Empty trailing summary comes back short and must be padded
        let jobs = vec![job(0, "Systems"), job(1, "APIs"), job(2, "")];
        for record in &jobs {
            append(&store, &handle, record).await.unwrap();
        }

        let read = read_all::<JobRecord>(&store, &handle).await.unwrap();
        assert_eq!(read, jobs);
        assert_eq!(stub.token_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_contacts_use_their_own_worksheet() {
        let stub = Arc::new(StubSpreadsheet::default());
        let base = spawn_stub(stub.clone()).await;
        let store = stub_store(&base);

        ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        let handle = ensure_table::<ContactRecord>(&store, "missy").await.unwrap();
        assert_eq!(handle.name, "contacts_missy");

        let contact = ContactRecord {
            timestamp: parse_timestamp("2024-05-09 10:00:00").unwrap(),
            job_role: "Engineer".to_string(),
            company: "Acme".to_string(),
            job_link: "https://acme.io/jobs/1".to_string(),
            people_contacted: "Ann, Bob".to_string(),
        };
        append(&store, &handle, &contact).await.unwrap();

        assert_eq!(
            read_all::<ContactRecord>(&store, &handle).await.unwrap(),
            vec![contact]
        );
        assert_eq!(stub.rows("missy").unwrap().len(), 1);
        assert_eq!(stub.rows("contacts_missy").unwrap()[0], headers(&CONTACT_HEADERS));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_missing_header_is_written_on_next_open() {
        let stub = Arc::new(StubSpreadsheet::default());
        stub.sheets
            .lock()
            .unwrap()
            .push(("missy".to_string(), Vec::new()));
        let base = spawn_stub(stub.clone()).await;
        let store = stub_store(&base);

        let handle = ensure_table::<JobRecord>(&store, "missy").await.unwrap();
        append(&store, &handle, &job(0, "Systems")).await.unwrap();

        let rows = stub.rows("missy").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], headers(&JOB_HEADERS));
        assert_eq!(
            read_all::<JobRecord>(&store, &handle).await.unwrap(),
            vec![job(0, "Systems")]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejected_token_surfaces_as_error() {
        let stub = Arc::new(StubSpreadsheet::default());
        let base = spawn_stub(stub.clone()).await;
        let store = SheetsStore::new(
            "sheet-id".to_string(),
            ServiceAccountKey {
                client_email: "tracker@project.iam.gserviceaccount.com".to_string(),
                private_key: TEST_KEY.to_string(),
                token_uri: format!("{}/missing-token-endpoint", base),
            },
        )
        .unwrap()
        .with_api_url(format!("{}/v4/spreadsheets", base));

        let err = ensure_table::<JobRecord>(&store, "missy").await.unwrap_err();
        assert!(err.to_string().contains("Token exchange failed"));
        assert!(stub.rows("missy").is_none());
    }

    #[test]
    fn test_sheet_range_quotes_titles() {
        assert_eq!(sheet_range("missy"), "'missy'");
        assert_eq!(sheet_range("o'brien"), "'o''brien'");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = store()
            .endpoint(&["values", "'contacts_missy':append"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-id/values/'contacts_missy':append"
        );

        let spaced = store().endpoint(&["values", "'a b'"]).unwrap();
        assert!(spaced.as_str().ends_with("/values/'a%20b'"));
    }

    #[test]
    fn test_normalize_rows_pads_and_skips_header() {
        let values = vec![
            vec![json!("Timestamp"), json!("Job Role"), json!("Company")],
            vec![json!("2024-05-09 10:00:00"), json!("Engineer"), json!("Acme")],
            vec![json!("2024-05-09 11:00:00")],
            vec![json!(42), Value::Null, json!("x"), json!("y")],
        ];

        let rows = normalize_rows(values, &headers(&["Timestamp", "Job Role", "Company"]));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["2024-05-09 10:00:00", "Engineer", "Acme"]);
        assert_eq!(rows[1], vec!["2024-05-09 11:00:00", "", ""]);
        // Longer rows are left alone so the record layer can reject them
        assert_eq!(rows[2], vec!["42", "", "x", "y"]);
    }

    #[test]
    fn test_first_row_kept_when_it_is_not_the_header() {
        let values = vec![
            vec![json!("2024-05-09 10:00:00"), json!("Engineer")],
            vec![json!("2024-05-09 11:00:00"), json!("Analyst")],
        ];

        let rows = normalize_rows(values, &headers(&["Timestamp", "Job Role"]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "Engineer");
    }

    #[test]
    fn test_empty_sheet_has_no_rows() {
        let job_headers = headers(&JOB_HEADERS);
        assert!(normalize_rows(Vec::new(), &job_headers).is_empty());
        let header_only = vec![JOB_HEADERS.iter().map(|h| json!(h)).collect()];
        assert!(normalize_rows(header_only, &job_headers).is_empty());
    }

    #[test]
    fn test_invalid_private_key_is_reported() {
        let err = store().signed_assertion(1_700_000_000).unwrap_err();
        assert!(err.to_string().contains("Invalid service account private key"));
    }

    #[test]
    fn test_service_account_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(
            r#"{"client_email":"a@b.iam.gserviceaccount.com","private_key":"k","type":"service_account"}"#,
        )
        .unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }
}
