//! Safe HTTP fetching with per-hop redirect validation.
//!
//! Automatic redirect following is disabled at the transport and the loop is
//! implemented here instead, so that every URL actually contacted (the
//! original and every redirect target) passes validation before a socket is
//! opened to it. Validating only the first URL and then blindly following
//! `Location` headers would let an attacker's server answer 302 towards an
//! internal address after the initial hostname passed (DNS rebinding /
//! validate-then-use).

use std::time::Duration;

use reqwest::header::{HeaderValue, HOST, LOCATION};
use reqwest::redirect::Policy as RedirectPolicy;
use reqwest::{Client, Method, Request, Response, StatusCode};
use tracing::debug;
use url::Url;

use crate::resolver::{Resolve, SystemResolver};
use crate::validate::{validate_with, Validated};
use crate::{Error, Policy};

/// Options for [`fetch`]. All knobs have defensive defaults.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request method for the first hop. Defaults to GET.
    pub method: Method,

    /// Which reserved ranges are fatal. Defaults to [`Policy::PublicOnly`].
    pub policy: Policy,

    /// Redirect ceiling; exceeding it is a terminal error. Defaults to 5.
    pub max_redirects: u32,

    /// Per-hop timeout covering connect, TLS and response. Defaults to 15s.
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            method: Method::GET,
            policy: Policy::PublicOnly,
            max_redirects: 5,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Fetch a URL with the system DNS resolver, following redirects safely.
///
/// Each hop is validated before it is contacted, a timeout bounds each hop,
/// and the final non-redirect response is returned. A 3xx response without a
/// `Location` header is returned as-is: it cannot be followed safely, and
/// the caller gets to see the raw redirect.
///
/// Validation and timeout errors propagate unchanged; nothing is retried
/// here. Worst-case latency is `timeout × (max_redirects + 1)`.
///
/// # Example
///
/// ```rust,no_run
/// use fetchguard::{fetch, read_text, FetchConfig};
///
/// # async fn example() -> Result<(), fetchguard::Error> {
/// let response = fetch("https://example.com/listing", &FetchConfig::default()).await?;
/// let text = read_text(response).await?;
/// # Ok(())
/// # }
/// ```
pub async fn fetch(url: &str, config: &FetchConfig) -> Result<Response, Error> {
    fetch_with(url, config, &SystemResolver).await
}

/// Fetch a URL with a caller-supplied resolver.
pub async fn fetch_with(
    url: &str,
    config: &FetchConfig,
    resolver: &dyn Resolve,
) -> Result<Response, Error> {
    let client = Client::builder()
        .redirect(RedirectPolicy::none())
        .timeout(config.timeout)
        .build()
        .map_err(|e| Error::transport(url, e.to_string()))?;

    let mut current_url = url.to_string();
    let mut method = config.method.clone();

    // Initial request plus up to `max_redirects` follows.
    for hop in 0..=config.max_redirects {
        let validated = validate_with(&current_url, config.policy, resolver).await?;

        let request = hop_request(&client, &validated, method.clone())?;
        let response = client
            .execute(request)
            .await
            .map_err(|e| transport_error(&current_url, config.timeout, e))?;

        if response.status().is_redirection() {
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|h| h.to_str().ok())
                .map(str::to_owned)
            else {
                return Ok(response);
            };

            let next = resolve_redirect(&validated.url, &location)?;
            method = redirect_method(response.status(), method);
            debug!(hop, from = %current_url, to = %next, "following redirect");

            // Abort the redirect body so the connection is released before
            // the next hop.
            drop(response);
            current_url = next;
            continue;
        }

        return Ok(response);
    }

    Err(Error::TooManyRedirects {
        url: url.to_string(),
        max: config.max_redirects,
    })
}

/// Synchronous version of [`fetch`].
///
/// Works both inside and outside of a Tokio runtime. When called from
/// outside a runtime, it creates a temporary one.
pub fn fetch_sync(url: &str, config: &FetchConfig) -> Result<Response, Error> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fetch(url, config)))
    } else {
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| Error::transport(url, e.to_string()))?;
        rt.block_on(fetch(url, config))
    }
}

/// Build the request for one hop.
///
/// Plain http: connect to the validated IP instead of the re-resolvable
/// hostname, with an explicit `Host` header carrying the original hostname
/// so the origin still sees the expected virtual-host identity. This closes
/// the rebinding window between validation and connect.
///
/// Https: connect by hostname, untouched. TLS certificate validation is
/// hostname-based; substituting the IP into the connection target would
/// break certificate matching.
fn hop_request(client: &Client, validated: &Validated, method: Method) -> Result<Request, Error> {
    if validated.https {
        return client
            .request(method, validated.url.clone())
            .build()
            .map_err(|e| Error::transport(validated.url.as_str(), e.to_string()));
    }

    let mut target = validated.url.clone();
    target
        .set_ip_host(validated.ip)
        .map_err(|_| Error::invalid_url(validated.url.as_str(), "cannot rewrite host"))?;

    let host_value = if validated.port == 80 {
        validated.host.clone()
    } else {
        format!("{}:{}", validated.host, validated.port)
    };
    let host_value = HeaderValue::from_str(&host_value)
        .map_err(|_| Error::invalid_url(validated.url.as_str(), "host is not a valid header value"))?;

    client
        .request(method, target)
        .header(HOST, host_value)
        .build()
        .map_err(|e| Error::transport(validated.url.as_str(), e.to_string()))
}

/// Resolve a redirect target (possibly relative) against the hop's URL.
fn resolve_redirect(base: &Url, location: &str) -> Result<String, Error> {
    let resolved = base
        .join(location)
        .map_err(|e| Error::invalid_redirect(location, e.to_string()))?;

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.into()),
        scheme => Err(Error::invalid_redirect(
            location,
            format!("scheme '{}' not allowed", scheme),
        )),
    }
}

/// Method adjustment when following a redirect: 303 always demotes to GET,
/// 301/302 demote POST to GET, 307/308 preserve the method.
fn redirect_method(status: StatusCode, method: Method) -> Method {
    if status == StatusCode::SEE_OTHER {
        return Method::GET;
    }
    let demote = status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND;
    if demote && method == Method::POST {
        return Method::GET;
    }
    method
}

fn transport_error(url: &str, timeout: Duration, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        Error::transport(url, err.to_string())
    }
}
