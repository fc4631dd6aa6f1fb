use anyhow::anyhow;
use reqwest::StatusCode;

/// One entry of a DBS server error payload.
///
/// The server usually responds with `[{"error": {...}, "http": {...}}]`,
/// but some endpoints return the inner object bare.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct DbsErrorDetail {
    #[serde(default)]
    pub(crate) reason: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) function: Option<String>,
    #[serde(default)]
    pub(crate) code: Option<i64>,
}

#[derive(Debug, serde::Deserialize)]
struct DbsErrorEnvelope {
    #[serde(default)]
    error: Option<DbsErrorDetail>,
}

pub(crate) fn parse_dbs_error(body: &str) -> Option<DbsErrorDetail> {
    if let Ok(mut envelopes) = serde_json::from_str::<Vec<DbsErrorEnvelope>>(body) {
        if let Some(first) = envelopes.drain(..).next() {
            return first.error;
        }
    }
    serde_json::from_str::<DbsErrorDetail>(body)
        .ok()
        .filter(|d| d.message.is_some() || d.reason.is_some())
}

pub(crate) fn format_dbs_error(status: StatusCode, url: &str, e: &DbsErrorDetail) -> anyhow::Error {
    let message = e.message.as_deref().unwrap_or("");
    let reason = e.reason.as_deref().unwrap_or("");
    let function = e.function.as_deref().unwrap_or("");
    let code = e.code.unwrap_or(0);

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "DBS authentication failed (HTTP {}).\n- Check that your grid proxy is valid and not expired: `voms-proxy-info`\n- Renew with `voms-proxy-init -voms cms` if needed\n\nServer message: {}\n{}\nrequest: {}",
            status.as_u16(),
            message,
            reason,
            url
        );
    }

    if status == StatusCode::NOT_FOUND {
        return anyhow!(
            "DBS endpoint not found (HTTP 404).\n- Check the --instance value and your configured base URL\n- Default base URL: https://cmsweb.cern.ch/dbs/prod\n\nServer message: {}\nrequest: {}",
            message,
            url
        );
    }

    anyhow!(
        "DBS request failed: HTTP {} for url ({})\n{}\n{}\nserver code: {} in {}",
        status.as_u16(),
        url,
        message,
        reason,
        code,
        function
    )
}
