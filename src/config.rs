use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::client::ClientConfig;

pub(crate) const DEFAULT_BASE_URL: &str = "https://cmsweb.cern.ch/dbs/prod";

#[derive(Debug, Default, PartialEq)]
struct RcConfig {
    url: Option<String>,
    proxy: Option<String>,
    verify: Option<bool>,
}

/// Resolves client configuration from (in order of precedence):
/// - explicit `url`/`proxy` arguments
/// - environment variables `DBSQUERY_URL` / `X509_USER_PROXY`
/// - rc file from `DBSQUERY_RC`, `./.dbsqueryrc` or `~/.dbsqueryrc`
///
/// A missing grid proxy means the catalog is unreachable; this fails before
/// any query with instructions for the operator.
pub(crate) fn load_config(
    url: Option<String>,
    proxy: Option<String>,
    verify: Option<bool>,
) -> Result<ClientConfig> {
    let url = url.or_else(|| std::env::var("DBSQUERY_URL").ok());
    let proxy = proxy.or_else(|| std::env::var("X509_USER_PROXY").ok());

    resolve_config(url, proxy, verify, &rc_candidates())
}

fn resolve_config(
    mut url: Option<String>,
    mut proxy: Option<String>,
    verify: Option<bool>,
    rc_candidates: &[PathBuf],
) -> Result<ClientConfig> {
    let mut file_verify: Option<bool> = None;

    if url.is_none() || proxy.is_none() || verify.is_none() {
        for rc_path in rc_candidates {
            if rc_path.exists() {
                let cfg = read_rc(rc_path).with_context(|| {
                    format!("failed to read configuration file {}", rc_path.display())
                })?;

                if url.is_none() {
                    url = cfg.url;
                }
                if proxy.is_none() {
                    proxy = cfg.proxy;
                }
                file_verify = cfg.verify;
                break;
            }
        }
    }

    let proxy = match proxy {
        Some(v) => v,
        None => bail!(
            "No grid proxy configured; DBS queries need an X.509 proxy certificate.\n\
             How to fix:\n\
             1) Run `voms-proxy-init -voms cms` and export X509_USER_PROXY, or\n\
             2) put `proxy: /path/to/proxy.pem` in {}",
            if rc_candidates.is_empty() {
                ".dbsqueryrc".to_string()
            } else {
                rc_candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" or ")
            }
        ),
    };

    Ok(ClientConfig {
        url: url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        proxy: PathBuf::from(proxy),
        verify: verify.or(file_verify).unwrap_or(true),
    })
}

fn read_rc(path: &Path) -> Result<RcConfig> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_rc(&text))
}

fn parse_rc(text: &str) -> RcConfig {
    let mut cfg = RcConfig::default();

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((k, v)) = line.split_once(':') {
            let v = strip_quotes(v.trim());
            if v.is_empty() {
                continue;
            }
            match k.trim() {
                "url" => cfg.url = Some(v.to_string()),
                "proxy" => cfg.proxy = Some(v.to_string()),
                "verify" => cfg.verify = Some(v != "0"),
                _ => {}
            }
        }
    }

    cfg
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order:
    // 1) DBSQUERY_RC (explicit)
    // 2) ./.dbsqueryrc (current working directory)
    // 3) ~/.dbsqueryrc
    if let Ok(p) = std::env::var("DBSQUERY_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".dbsqueryrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".dbsqueryrc"));
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_comments_and_quotes() {
        let cfg = parse_rc(
            "# dbsquery configuration\n\
             url: https://cmsweb-testbed.cern.ch/dbs/int\n\
             proxy: \"/tmp/x509up_u1000\"\n\
             verify: 0\n",
        );
        assert_eq!(
            cfg,
            RcConfig {
                url: Some("https://cmsweb-testbed.cern.ch/dbs/int".to_string()),
                proxy: Some("/tmp/x509up_u1000".to_string()),
                verify: Some(false),
            }
        );
    }

    #[test]
    fn ignores_unknown_keys_and_empty_values() {
        let cfg = parse_rc("token: abc\nurl:\nproxy: /tmp/p\n");
        assert_eq!(cfg.url, None);
        assert_eq!(cfg.proxy.as_deref(), Some("/tmp/p"));
    }

    #[test]
    fn missing_proxy_fails_with_actionable_diagnostic() {
        let err = resolve_config(None, None, None, &[]).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("voms-proxy-init"));
        assert!(text.contains("X509_USER_PROXY"));
        assert!(text.contains(".dbsqueryrc"));
    }

    #[test]
    fn missing_proxy_diagnostic_names_the_rc_candidates() {
        let candidates = vec![PathBuf::from("/nonexistent/.dbsqueryrc")];
        let err = resolve_config(None, None, None, &candidates).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/.dbsqueryrc"));
    }

    #[test]
    fn explicit_proxy_resolves_with_defaults() {
        let cfg = resolve_config(None, Some("/tmp/x509up_u1000".to_string()), None, &[]).unwrap();
        assert_eq!(cfg.url, DEFAULT_BASE_URL);
        assert_eq!(cfg.proxy, PathBuf::from("/tmp/x509up_u1000"));
        assert!(cfg.verify);
    }

    #[test]
    fn strip_quotes_handles_both_quote_styles() {
        assert_eq!(strip_quotes("'/tmp/p'"), "/tmp/p");
        assert_eq!(strip_quotes("\"/tmp/p\""), "/tmp/p");
        assert_eq!(strip_quotes("/tmp/p"), "/tmp/p");
    }
}
