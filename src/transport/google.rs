//! Google Sheets transport
//!
//! Concrete [`SheetTransport`] implementation over the Sheets v4 values
//! API (append/update/batchUpdate/batchClear/addSheet) and the gviz `tq`
//! endpoint for tabular queries.
//!
//! All calls are blocking and authenticated with a bearer credential from
//! a [`CredentialProvider`]. How credentials are obtained or refreshed is
//! out of scope; the provider is only required to return current, usable
//! credentials on demand.

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::a1::A1Range;
use crate::error::{GridError, Result};
use crate::transport::{BatchUpdateRequest, Cell, InsertMode, MutationResult, SheetTransport};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const GVIZ_API_BASE: &str = "https://docs.google.com/spreadsheets/d";

const VALUE_INPUT_USER_ENTERED: &str = "USER_ENTERED";
const VALUE_RENDER_FORMATTED: &str = "FORMATTED_VALUE";
const MAJOR_DIMENSION_ROWS: &str = "ROWS";

// =============================================================================
// Credential Provider
// =============================================================================

/// Source of the opaque bearer credential attached to every call.
pub trait CredentialProvider {
    /// Return a currently-usable bearer token.
    fn bearer_token(&self) -> Result<String>;
}

/// A fixed, pre-obtained bearer token.
///
/// Useful for short-lived scripts and tests; anything long-running needs a
/// provider that refreshes.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// Transport
// =============================================================================

/// [`SheetTransport`] over the Google Sheets HTTP APIs.
pub struct GoogleSheetTransport<C: CredentialProvider> {
    client: Client,
    credentials: C,
}

impl<C: CredentialProvider> GoogleSheetTransport<C> {
    pub fn new(credentials: C) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    /// `{base}/{spreadsheet_id}/values/{last_segment}`
    fn values_url(&self, spreadsheet_id: &str, last_segment: &str) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| GridError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GridError::Transport("cannot build request url".to_string()))?
            .push(spreadsheet_id)
            .push("values")
            .push(last_segment);
        Ok(url)
    }

    /// `{base}/{spreadsheet_id}/{op}` where `op` is an API verb segment
    /// such as `values:batchClear`, or empty for no trailing segment.
    fn op_url(&self, spreadsheet_id: &str, op: &str) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| GridError::Transport(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GridError::Transport("cannot build request url".to_string()))?;
            segments.push(spreadsheet_id);
            if !op.is_empty() {
                segments.push(op);
            }
        }
        Ok(url)
    }

    /// Surface non-2xx responses as transport errors carrying the
    /// backend's diagnostic body.
    fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().unwrap_or_default();
        Err(GridError::Transport(format!("{}: {}", status, body)))
    }

    fn insert_rows(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
        insert_data_option: &str,
    ) -> Result<MutationResult> {
        let url = self.values_url(spreadsheet_id, &format!("{}:append", range))?;
        let resp = self
            .client
            .post(url)
            .bearer_auth(self.credentials.bearer_token()?)
            .query(&[
                ("insertDataOption", insert_data_option),
                ("includeValuesInResponse", "true"),
                ("responseValueRenderOption", VALUE_RENDER_FORMATTED),
                ("valueInputOption", VALUE_INPUT_USER_ENTERED),
            ])
            .json(&json!({ "values": values }))
            .send()?;

        let parsed: AppendResponse = Self::check(resp)?.json()?;
        Ok(parsed.updates.into_result())
    }
}

impl<C: CredentialProvider> SheetTransport for GoogleSheetTransport<C> {
    fn create_sheet(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<()> {
        let url = self.op_url(&format!("{}:batchUpdate", spreadsheet_id), "")?;

        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": sheet_name } } }]
        });

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.credentials.bearer_token()?)
            .json(&body)
            .send()?;

        Self::check(resp)?;
        Ok(())
    }

    fn append(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
        mode: InsertMode,
    ) -> Result<MutationResult> {
        let option = match mode {
            InsertMode::Insert => "INSERT_ROWS",
            InsertMode::Overwrite => "OVERWRITE",
        };
        self.insert_rows(spreadsheet_id, range, values, option)
    }

    fn update(
        &self,
        spreadsheet_id: &str,
        range: &A1Range,
        values: &[Vec<String>],
    ) -> Result<MutationResult> {
        let url = self.values_url(spreadsheet_id, &range.notation())?;
        let body = json!({
            "majorDimension": MAJOR_DIMENSION_ROWS,
            "range": range.notation(),
            "values": values,
        });

        let resp = self
            .client
            .put(url)
            .bearer_auth(self.credentials.bearer_token()?)
            .query(&[
                ("includeValuesInResponse", "true"),
                ("responseValueRenderOption", VALUE_RENDER_FORMATTED),
                ("valueInputOption", VALUE_INPUT_USER_ENTERED),
            ])
            .json(&body)
            .send()?;

        let parsed: UpdateValuesResponse = Self::check(resp)?.json()?;
        Ok(parsed.into_result())
    }

    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: &[BatchUpdateRequest],
    ) -> Result<Vec<MutationResult>> {
        let url = self.op_url(spreadsheet_id, "values:batchUpdate")?;
        let data: Vec<_> = requests
            .iter()
            .map(|req| {
                json!({
                    "majorDimension": MAJOR_DIMENSION_ROWS,
                    "range": req.range.notation(),
                    "values": req.values,
                })
            })
            .collect();

        let body = json!({
            "includeValuesInResponse": true,
            "responseValueRenderOption": VALUE_RENDER_FORMATTED,
            "valueInputOption": VALUE_INPUT_USER_ENTERED,
            "data": data,
        });

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.credentials.bearer_token()?)
            .json(&body)
            .send()?;

        let parsed: BatchUpdateValuesResponse = Self::check(resp)?.json()?;
        Ok(parsed
            .responses
            .into_iter()
            .map(UpdateValuesResponse::into_result)
            .collect())
    }

    fn clear(&self, spreadsheet_id: &str, ranges: &[A1Range]) -> Result<()> {
        let url = self.op_url(spreadsheet_id, "values:batchClear")?;
        let notations: Vec<String> = ranges.iter().map(A1Range::notation).collect();

        let resp = self
            .client
            .post(url)
            .bearer_auth(self.credentials.bearer_token()?)
            .json(&json!({ "ranges": notations }))
            .send()?;

        Self::check(resp)?;
        Ok(())
    }

    fn query(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
        query: &str,
        has_header: bool,
    ) -> Result<Vec<Vec<Cell>>> {
        let mut url = Url::parse(GVIZ_API_BASE).map_err(|e| GridError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| GridError::Transport("cannot build request url".to_string()))?
            .push(spreadsheet_id)
            .push("gviz")
            .push("tq");
        url.query_pairs_mut()
            .append_pair("sheet", sheet_name)
            .append_pair("tqx", "responseHandler:gridstore")
            .append_pair("tq", query)
            .append_pair("headers", if has_header { "1" } else { "0" });

        let resp = self
            .client
            .get(url)
            .bearer_auth(self.credentials.bearer_token()?)
            .send()?;

        let body = Self::check(resp)?.text()?;
        parse_query_response(&body)
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct AppendResponse {
    updates: UpdateValuesResponse,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    updated_range: String,
    #[serde(default)]
    updated_rows: u32,
    #[serde(default)]
    updated_columns: u32,
    #[serde(default)]
    updated_cells: u32,
    #[serde(default)]
    updated_data: Option<ValueRange>,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct BatchUpdateValuesResponse {
    #[serde(default)]
    responses: Vec<UpdateValuesResponse>,
}

impl UpdateValuesResponse {
    fn into_result(self) -> MutationResult {
        let values = self
            .updated_data
            .unwrap_or_default()
            .values
            .into_iter()
            .map(|row| row.into_iter().map(|v| cell_text(&v)).collect())
            .collect();

        MutationResult {
            updated_range: A1Range::from_notation(&self.updated_range),
            updated_rows: self.updated_rows,
            updated_columns: self.updated_columns,
            updated_cells: self.updated_cells,
            values,
        }
    }
}

/// Formatted-value rendering returns strings, but the conversion is kept
/// total in case the backend hands back a bare number or boolean.
fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

// =============================================================================
// Query Response Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct QueryResponse {
    table: QueryTable,
}

#[derive(Debug, Deserialize)]
struct QueryTable {
    cols: Vec<QueryCol>,
    rows: Vec<QueryRow>,
}

#[derive(Debug, Deserialize)]
struct QueryCol {
    #[serde(rename = "type")]
    col_type: String,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    c: Vec<Option<QueryCell>>,
}

#[derive(Debug, Deserialize)]
struct QueryCell {
    #[serde(default)]
    v: serde_json::Value,
    #[serde(default)]
    f: Option<String>,
}

/// Parse the gviz `tq` payload into typed cells.
///
/// The payload arrives wrapped in a response handler call,
/// `gridstore({...})`; only the JSON between the first `{` and the last
/// `}` matters. Missing cells decode to [`Cell::Null`] at their position.
pub fn parse_query_response(body: &str) -> Result<Vec<Vec<Cell>>> {
    let start = body
        .find('{')
        .ok_or_else(|| GridError::Transport("malformed query response".to_string()))?;
    let end = body
        .rfind('}')
        .ok_or_else(|| GridError::Transport("malformed query response".to_string()))?;

    let parsed: QueryResponse = serde_json::from_str(&body[start..=end])?;
    let cols = parsed.table.cols;

    let mut results = Vec::with_capacity(parsed.table.rows.len());
    for row in parsed.table.rows {
        let mut cells = Vec::with_capacity(row.c.len());
        for (idx, cell) in row.c.iter().enumerate() {
            let col = cols.get(idx).ok_or_else(|| {
                GridError::Transport("query row wider than column metadata".to_string())
            })?;
            cells.push(parse_cell(cell.as_ref(), &col.col_type)?);
        }
        results.push(cells);
    }

    Ok(results)
}

fn parse_cell(cell: Option<&QueryCell>, col_type: &str) -> Result<Cell> {
    let cell = match cell {
        Some(c) if !c.v.is_null() => c,
        // Empty cells carry no value at all.
        _ => return Ok(Cell::Null),
    };

    match col_type {
        "boolean" => cell
            .v
            .as_bool()
            .map(Cell::Bool)
            .ok_or_else(|| GridError::Transport("boolean cell without boolean value".to_string())),
        "number" => Ok(parse_number_cell(cell)),
        "string" => cell
            .v
            .as_str()
            .map(|s| Cell::Text(s.to_string()))
            .ok_or_else(|| GridError::Transport("string cell without string value".to_string())),
        // Temporal columns surface their formatted string form.
        "date" | "datetime" | "timeofday" => Ok(Cell::Text(
            cell.f.clone().unwrap_or_else(|| cell_text(&cell.v)),
        )),
        other => Err(GridError::Transport(format!(
            "cell type {} is not supported",
            other
        ))),
    }
}

fn parse_number_cell(cell: &QueryCell) -> Cell {
    // The formatted value decides integer vs float. Computed cells
    // (aggregates) come back with no formatted value and are integers.
    if let Some(f) = &cell.f {
        if f.contains('.') {
            if let Ok(v) = f.parse::<f64>() {
                return Cell::Float(v);
            }
        } else if let Ok(v) = f.parse::<i64>() {
            return Cell::Int(v);
        }
    }

    match cell.v.as_f64() {
        Some(v) if v.fract() == 0.0 => Cell::Int(v as i64),
        Some(v) => Cell::Float(v),
        None => Cell::Null,
    }
}
