// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use prefdesk_app::{PreferenceFlags, PreferenceRecord, RemoteTable};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_TABLE: &str = "user_preferences";
const REST_PREFIX: &str = "rest/v1";

/// Blocking PostgREST client for one table.
#[derive(Debug, Clone)]
pub struct RestTable {
    base_url: String,
    table: String,
    endpoint: String,
    http: HttpClient,
}

impl RestTable {
    pub fn new(base_url: &str, table: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("remote.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("remote.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "remote.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let table = table.trim();
        if table.is_empty() {
            bail!("remote.table must not be empty");
        }
        if api_key.trim().is_empty() {
            bail!("remote.api_key is empty -- set it in the config or export PREFDESK_API_KEY");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(auth_headers(api_key.trim())?)
            .build()
            .context("build HTTP client")?;

        let endpoint = format!("{base_url}/{REST_PREFIX}/{table}");
        Ok(Self {
            base_url,
            table: table.to_owned(),
            endpoint,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Confirms the table is reachable and readable with the configured key.
    pub fn ping(&self) -> Result<()> {
        let response = self.send(
            self.http
                .get(&self.endpoint)
                .query(&[("select", "id"), ("limit", "1")]),
        )?;
        let _rows: Vec<serde_json::Value> = response
            .json()
            .with_context(|| format!("decode rows from table {}", self.table))?;
        Ok(())
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(response)
    }

    fn fetch_rows(&self, filter: String, limit: Option<usize>) -> Result<Vec<PreferenceRecord>> {
        debug!(table = %self.table, %filter, ?limit, "select");
        let mut request = self.http.get(&self.endpoint).query(&[
            ("select", PreferenceRecord::SELECT_COLUMNS),
            ("name", filter.as_str()),
        ]);
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        let response = self.send(request)?;
        response
            .json()
            .with_context(|| format!("decode rows from table {}", self.table))
    }
}

impl RemoteTable for RestTable {
    fn lookup_by_exact_name(&self, name: &str) -> Result<Option<PreferenceRecord>> {
        let mut rows = self
            .fetch_rows(format!("eq.{name}"), Some(2))
            .with_context(|| format!("look up {name:?}"))?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            n => Err(anyhow!("expected a single row named {name:?}, found {n}")),
        }
    }

    fn update_flags(&self, name: &str, flags: &PreferenceFlags) -> Result<()> {
        debug!(table = %self.table, record = name, "update");
        self.send(
            self.http
                .patch(&self.endpoint)
                .query(&[("name", format!("eq.{name}"))])
                .header("Prefer", "return=minimal")
                .json(flags),
        )
        .with_context(|| format!("update {name:?}"))?;
        Ok(())
    }

    fn search_by_name_substring(&self, query: &str) -> Result<Vec<PreferenceRecord>> {
        let rows = self
            .fetch_rows(format!("ilike.*{}*", escape_like(query)), None)
            .with_context(|| format!("search for {query:?}"))?;
        if !query.contains('*') {
            return Ok(rows);
        }
        // PostgREST reads `*` as a wildcard and offers no escape for it.
        let needle = query.to_lowercase();
        Ok(rows
            .into_iter()
            .filter(|row| row.name.to_lowercase().contains(&needle))
            .collect())
    }
}

/// Escapes LIKE metacharacters so the query matches literally.
pub fn escape_like(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let key = HeaderValue::from_str(api_key).context("remote.api_key is not a valid header value")?;
    let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
        .context("remote.api_key is not a valid header value")?;
    headers.insert("apikey", key);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check remote.base_url and your network ({})",
        base_url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<PostgrestError>(body)
        && let Some(message) = parsed.message.filter(|message| !message.is_empty())
    {
        let code = parsed
            .code
            .map(|code| format!(" [{code}]"))
            .unwrap_or_default();
        return match parsed.hint.filter(|hint| !hint.is_empty()) {
            Some(hint) => anyhow!(
                "server error ({}){code}: {message} -- {hint}",
                status.as_u16()
            ),
            None => anyhow!("server error ({}){code}: {message}", status.as_u16()),
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "server rejected credentials ({}) -- check remote.api_key",
            status.as_u16()
        );
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}
