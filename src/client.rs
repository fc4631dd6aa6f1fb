use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::load_config;
use crate::error::{format_dbs_error, parse_dbs_error};
use crate::query::{Catalog, DatasetQuery};
use crate::records::{DatasetRecord, FileRecord};

/// Named deployment of the DBS reader service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Instance {
    #[default]
    Global,
    Phys01,
    Phys02,
    Phys03,
    Caf,
}

impl Instance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Instance::Global => "global",
            Instance::Phys01 => "phys01",
            Instance::Phys02 => "phys02",
            Instance::Phys03 => "phys03",
            Instance::Caf => "caf",
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base DBS URL, typically `https://cmsweb.cern.ch/dbs/prod`.
    pub url: String,
    /// Path to the X.509 grid proxy certificate (PEM, cert + key).
    pub proxy: PathBuf,
    /// Whether to verify TLS certificates.
    pub verify: bool,
}

/// Blocking read-only client for one DBS reader instance.
#[derive(Debug, Clone)]
pub struct DbsClient {
    endpoint: String,
    http: HttpClient,
}

impl DbsClient {
    /// Creates a client using environment variables and/or `.dbsqueryrc`.
    ///
    /// This is equivalent to `DbsClient::new(instance, None, None, None)`.
    pub fn from_env(instance: Instance) -> Result<Self> {
        Self::new(instance, None, None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `url`/`proxy` arguments
    /// - environment variables `DBSQUERY_URL` / `X509_USER_PROXY`
    /// - config file from `DBSQUERY_RC` or `.dbsqueryrc`
    ///
    /// Fails without issuing any request when no grid proxy is available.
    pub fn new(
        instance: Instance,
        url: Option<String>,
        proxy: Option<String>,
        verify: Option<bool>,
    ) -> Result<Self> {
        let cfg = load_config(url, proxy, verify)?;

        let pem = std::fs::read(&cfg.proxy).with_context(|| {
            format!(
                "failed to read grid proxy {}; run `voms-proxy-init -voms cms` to create one",
                cfg.proxy.display()
            )
        })?;
        let identity = reqwest::Identity::from_pem(&pem)
            .with_context(|| format!("invalid grid proxy {}", cfg.proxy.display()))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dbsquery/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("dbsquery")),
        );

        let mut builder = HttpClient::builder()
            .default_headers(default_headers)
            .use_rustls_tls()
            .identity(identity)
            .timeout(Duration::from_secs(60));

        if !cfg.verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            endpoint: reader_endpoint(&cfg.url, instance),
            http,
        })
    }

    fn api_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T> {
        let url = format!("{}/{}", self.endpoint, path);
        let resp = self
            .http
            .get(&url)
            .query(params)
            .send()
            .with_context(|| format!("could not connect to {}", url))?;

        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            if let Some(detail) = parse_dbs_error(&text) {
                return Err(format_dbs_error(status, &url, &detail));
            }

            bail!(
                "DBS request failed: HTTP {} for url ({})\n{}",
                status,
                url,
                text
            );
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("failed to parse DBS JSON (url={}, status={})", url, status))
    }
}

impl Catalog for DbsClient {
    fn lookup_datasets(&self, query: &DatasetQuery) -> Result<Vec<DatasetRecord>> {
        self.api_get("datasets", &query.as_params())
    }

    fn lookup_files(&self, dataset: &str) -> Result<Vec<FileRecord>> {
        self.api_get("files", &[("dataset", dataset.to_string())])
    }
}

fn reader_endpoint(base: &str, instance: Instance) -> String {
    format!("{}/{}/DBSReader", base.trim_end_matches('/'), instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_embeds_the_instance() {
        assert_eq!(
            reader_endpoint("https://cmsweb.cern.ch/dbs/prod", Instance::Phys03),
            "https://cmsweb.cern.ch/dbs/prod/phys03/DBSReader"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(
            reader_endpoint("https://cmsweb.cern.ch/dbs/prod/", Instance::Global),
            "https://cmsweb.cern.ch/dbs/prod/global/DBSReader"
        );
    }

    #[test]
    fn instance_names_match_the_service_paths() {
        let names: Vec<&str> = [
            Instance::Global,
            Instance::Phys01,
            Instance::Phys02,
            Instance::Phys03,
            Instance::Caf,
        ]
        .iter()
        .map(Instance::as_str)
        .collect();
        assert_eq!(names, ["global", "phys01", "phys02", "phys03", "caf"]);
    }
}
