//! Session transport: one logical HTTP session with an accumulating cookie jar.
//!
//! The raw request/response exchange sits behind [`Exchange`] so the session
//! (and everything layered on it) can be driven by a scripted fake in tests.
//! [`UreqExchange`] is the production implementation.
//!
//! # Invariants
//!
//! - Every outbound request carries every cookie accumulated so far.
//! - Cookies from every response are added to the jar, never dropped.
//! - Redirects are not followed; callers inspect `Location` themselves.

use crate::error::RtcError;
use std::fmt;
use std::io::Read;
use tracing::{debug, info};

/// Content type used for every request body the service accepts.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully prepared request, cookies and content type included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// First header value matching `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Cookies set by this response, in header order.
    pub cookies: Vec<Cookie>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response, parsing `Set-Cookie` headers into [`Cookie`]s.
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let cookies = headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("set-cookie"))
            .filter_map(|(_, value)| Cookie::parse(value))
            .collect();
        Self {
            status,
            headers,
            cookies,
            body,
        }
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.status >= 400
    }

    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse the `name=value` pair of a `Set-Cookie` header, ignoring attributes.
    #[must_use]
    pub fn parse(set_cookie: &str) -> Option<Self> {
        let pair = set_cookie.split(';').next()?.trim();
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name, value.trim()))
    }
}

/// How the jar treats a cookie whose name it already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookiePolicy {
    /// Keep every cookie ever received, duplicates included.
    #[default]
    Append,
    /// Replace the existing cookie of the same name in place.
    LastWriteWins,
}

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    policy: CookiePolicy,
    cookies: Vec<Cookie>,
}

impl CookieJar {
    #[must_use]
    pub const fn with_policy(policy: CookiePolicy) -> Self {
        Self {
            policy,
            cookies: Vec::new(),
        }
    }

    pub fn add(&mut self, cookie: Cookie) {
        if self.policy == CookiePolicy::LastWriteWins {
            if let Some(existing) = self.cookies.iter_mut().find(|c| c.name == cookie.name) {
                *existing = cookie;
                return;
            }
        }
        self.cookies.push(cookie);
    }

    pub fn extend(&mut self, cookies: impl IntoIterator<Item = Cookie>) {
        for cookie in cookies {
            self.add(cookie);
        }
    }

    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Cookie` request header value, or `None` when the jar is empty.
    #[must_use]
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let joined = self
            .cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        Some(joined)
    }
}

/// One raw HTTP round trip. No cookie handling, no redirects.
pub trait Exchange {
    /// Perform the request and return whatever the server answered.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::Transport`] when no response could be obtained.
    /// HTTP error statuses are responses, not errors.
    fn exchange(&mut self, request: &HttpRequest) -> Result<HttpResponse, RtcError>;
}

/// Blocking [`Exchange`] backed by a `ureq` agent.
pub struct UreqExchange {
    agent: ureq::Agent,
}

impl UreqExchange {
    #[must_use]
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().redirects(0).build(),
        }
    }
}

impl Default for UreqExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange for UreqExchange {
    fn exchange(&mut self, request: &HttpRequest) -> Result<HttpResponse, RtcError> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (name, value) in &request.headers {
            call = call.set(name, value);
        }

        let result = match request.method {
            Method::Get => call.call(),
            Method::Post => call.send_string(&request.body),
        };

        let response = match result {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(RtcError::Transport {
                    url: redact_url(&request.url),
                    message: err.to_string(),
                });
            }
        };

        let status = response.status();
        let mut headers = Vec::new();
        for name in response.headers_names() {
            for value in response.all(&name) {
                headers.push((name.clone(), value.to_string()));
            }
        }

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|err| RtcError::Transport {
                url: request.url.clone(),
                message: format!("failed to read response body: {err}"),
            })?;

        Ok(HttpResponse::new(status, headers, body))
    }
}

/// A logical session: an [`Exchange`] plus the cookies it has accumulated.
pub struct Session<X> {
    exchange: X,
    jar: CookieJar,
    verbose: bool,
}

impl<X: Exchange> Session<X> {
    pub fn new(exchange: X) -> Self {
        Self::with_policy(exchange, CookiePolicy::default())
    }

    pub fn with_policy(exchange: X, policy: CookiePolicy) -> Self {
        Self {
            exchange,
            jar: CookieJar::with_policy(policy),
            verbose: false,
        }
    }

    /// Log request headers and jar contents at `info` instead of `debug`.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    #[must_use]
    pub const fn jar(&self) -> &CookieJar {
        &self.jar
    }

    #[must_use]
    pub const fn exchange(&self) -> &X {
        &self.exchange
    }

    /// Send one request carrying all accumulated cookies, then absorb the
    /// response's cookies into the jar.
    ///
    /// # Errors
    ///
    /// Propagates [`RtcError::Transport`] from the exchange.
    pub fn send(&mut self, method: Method, url: &str, body: &str) -> Result<HttpResponse, RtcError> {
        let mut headers = vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())];
        if let Some(cookie) = self.jar.header_value() {
            headers.push(("Cookie".to_string(), cookie));
        }

        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body: body.to_string(),
        };

        let logged_url = redact_url(url);
        if self.verbose {
            let names: Vec<&str> = self.jar.cookies().iter().map(|c| c.name.as_str()).collect();
            info!(%method, url = %logged_url, cookies = ?names, "requesting");
        } else {
            debug!(%method, url = %logged_url, cookies = self.jar.len(), "requesting");
        }

        let response = self.exchange.exchange(&request)?;

        if self.verbose {
            info!(status = response.status, headers = ?redact_headers(&response.headers), "response");
        } else {
            debug!(status = response.status, bytes = response.body.len(), "response");
        }

        self.jar.extend(response.cookies.iter().cloned());
        Ok(response)
    }
}

/// Query parameters whose values never reach the logs.
const SECRET_PARAMS: [&str; 2] = ["j_password", "password"];

/// `url` with secret query values masked.
pub(crate) fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let pairs: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if SECRET_PARAMS.iter().any(|s| key.eq_ignore_ascii_case(s)) => {
                format!("{key}=***")
            }
            _ => pair.to_string(),
        })
        .collect();
    format!("{base}?{}", pairs.join("&"))
}

/// Response headers for logging; cookies keep their names only.
fn redact_headers(headers: &[(String, String)]) -> Vec<(&str, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("set-cookie") {
                let cookie = Cookie::parse(value).map_or_else(String::new, |c| c.name);
                (name.as_str(), format!("{cookie}=***"))
            } else {
                (name.as_str(), value.clone())
            }
        })
        .collect()
}
