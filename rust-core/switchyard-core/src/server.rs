//! # HTTP Server
//!
//! HTTP/1.1 transport adapter built on Hyper and Tokio.
//!
//! Translates HTTP requests into [`Request`]s, runs them through a sealed
//! [`Dispatcher`] and writes the response payload back as JSON.
//!
//! ## Key Features
//!
//! - GET/POST/PATCH/DELETE map to pull/push/update/delete
//! - `Authorization: Bearer <token>` lands in request metadata
//! - Query parameters and JSON object bodies are merged into the payload
//! - Graceful shutdown: stop accepting, then drain in-flight connections

use crate::config::Config;
use crate::error::{Error, Result};
use crate::json;
use crate::request::{Request, RequestKind, Response, Status};
use crate::router::Dispatcher;
use crate::value::Value;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
pub use hyper::body::Bytes;
use hyper::body::Incoming;
pub use hyper::Method;
use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Config key for the listen address
pub const LISTEN_ADDRESS_KEY: &str = "http.listenaddress";
/// Config key toggling HTTP keep-alive
pub const KEEP_ALIVE_KEY: &str = "http.keepalive";
/// Config key for the request body limit in bytes
pub const MAX_BODY_SIZE_KEY: &str = "http.maxbodysize";
/// Config key for the drain timeout in seconds
pub const SHUTDOWN_TIMEOUT_KEY: &str = "http.shutdowntimeout";

/// Response header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const BEARER_PREFIX: &str = "Bearer ";
const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub address: SocketAddr,
    /// Enable keep-alive connections
    pub keep_alive: bool,
    /// Shutdown timeout for graceful shutdown (default: 30 seconds)
    pub shutdown_timeout: Duration,
    /// Max request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 8000).into(),
            keep_alive: false,
            shutdown_timeout: Duration::from_secs(30),
            max_body_size: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Read the `http.*` keys, falling back to defaults
    ///
    /// Negative or non-numeric sizes and timeouts fall back to the default.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidAddress` if the listen address does not parse
    pub fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();

        let address_text = config.get_string(LISTEN_ADDRESS_KEY, &defaults.address.to_string());
        let address = address_text
            .parse()
            .map_err(|_| Error::InvalidAddress {
                address: address_text.clone(),
            })?;

        let max_body_size = unsigned(config, MAX_BODY_SIZE_KEY)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(defaults.max_body_size);
        let shutdown_timeout = unsigned(config, SHUTDOWN_TIMEOUT_KEY)
            .map_or(defaults.shutdown_timeout, Duration::from_secs);

        Ok(Self {
            address,
            keep_alive: config.get_bool(KEEP_ALIVE_KEY, defaults.keep_alive),
            shutdown_timeout,
            max_body_size,
        })
    }
}

fn unsigned(config: &Config, key: &str) -> Option<u64> {
    config
        .get(key, Value::Null)
        .to_int()
        .and_then(|n| u64::try_from(n).ok())
}

/// Fully rendered HTTP reply
#[derive(Debug, Clone)]
pub struct Reply {
    /// HTTP status code
    pub status: StatusCode,
    /// JSON body
    pub body: String,
    /// Id of the dispatched request, when one was created
    pub request_id: Option<String>,
}

impl Reply {
    fn json(status: StatusCode, body: String) -> Self {
        Self {
            status,
            body,
            request_id: None,
        }
    }

    fn error(status: StatusCode, message: impl std::fmt::Display) -> Self {
        let body = serde_json::json!({ "error": message.to_string() }).to_string();
        Self::json(status, body)
    }

    fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }

    /// Parse the body back into JSON
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the body is not valid JSON
    pub fn json_body(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut response = hyper::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        if let Some(id) = self
            .request_id
            .and_then(|id| HeaderValue::from_str(&id).ok())
        {
            headers.insert(REQUEST_ID_HEADER, id);
        }
        response
    }
}

/// Map an HTTP method to a request kind
#[must_use]
pub fn request_kind(method: &Method) -> Option<RequestKind> {
    match *method {
        Method::GET => Some(RequestKind::Pull),
        Method::POST => Some(RequestKind::Push),
        Method::PATCH => Some(RequestKind::Update),
        Method::DELETE => Some(RequestKind::Delete),
        _ => None,
    }
}

/// Map a response status to an HTTP status code
#[must_use]
pub const fn http_status(status: Status) -> StatusCode {
    match status {
        Status::Ok => StatusCode::OK,
        Status::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        Status::InvalidData => StatusCode::UNPROCESSABLE_ENTITY,
        Status::NotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        Status::NotAuthorized => StatusCode::FORBIDDEN,
        Status::AuthenticationRequired => StatusCode::UNAUTHORIZED,
        Status::ResourceCreated => StatusCode::CREATED,
        Status::ResourceNotFound => StatusCode::NOT_FOUND,
        Status::ResourceAlreadyExists => StatusCode::FOUND,
    }
}

/// Transport-level view of an HTTP request
struct Inbound {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

/// HTTP front end for a [`Dispatcher`]
#[derive(Debug, Clone)]
pub struct Server {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl Server {
    /// Create a new Server instance
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: ServerConfig) -> Self {
        Self { config, dispatcher }
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the address is unavailable
    pub fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.address;
        let bind_error = |source| Error::BindError {
            address: addr.to_string(),
            source,
        };

        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(bind_error)?;
        socket.set_reuseaddr(true).map_err(bind_error)?;
        socket.bind(addr).map_err(bind_error)?;
        socket.listen(1024).map_err(bind_error)
    }

    /// Serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the address is unavailable
    pub async fn serve(&self) -> Result<()> {
        self.serve_with_shutdown(shutdown_signal()).await
    }

    /// Serve until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns `Error::BindError` if the address is unavailable
    pub async fn serve_with_shutdown<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind()?;
        self.serve_on(listener, shutdown).await
    }

    /// Serve connections from an already bound listener until `shutdown`
    /// resolves, then drain in-flight connections
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the listener address cannot be read
    pub async fn serve_on<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Server listening on http://{}", listener.local_addr()?);

        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, remote_addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    connections.spawn(serve_connection(
                        TokioIo::new(stream),
                        remote_addr,
                        self.dispatcher.clone(),
                        self.config.clone(),
                    ));
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Connection task failed");
                    }
                }
                () = &mut shutdown => {
                    info!("Shutdown signal received, stopping server...");
                    break;
                }
            }
        }
        drop(listener);

        let in_flight = connections.len();
        if in_flight > 0 {
            info!(connections = in_flight, "Waiting for in-flight connections");
            let drain = async { while connections.join_next().await.is_some() {} };
            if tokio::time::timeout(self.config.shutdown_timeout, drain)
                .await
                .is_err()
            {
                warn!(
                    connections = connections.len(),
                    "Shutdown timeout elapsed, aborting connections"
                );
                connections.abort_all();
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Execute a test request directly without network stack
    ///
    /// `uri` may carry a query string. Header pairs that are not valid HTTP
    /// headers are skipped.
    pub async fn test_request(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
        body: Option<Bytes>,
    ) -> Reply {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (uri.to_string(), None),
        };

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                header_map.append(name, value);
            }
        }

        let inbound = Inbound {
            method,
            path,
            query,
            headers: header_map,
            body: body.unwrap_or_default(),
        };
        process_request(&self.dispatcher, self.config.max_body_size, inbound)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
}

async fn serve_connection(
    io: TokioIo<tokio::net::TcpStream>,
    remote_addr: SocketAddr,
    dispatcher: Dispatcher,
    config: ServerConfig,
) {
    let max_body_size = config.max_body_size;
    let service = service_fn(move |req: hyper::Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        async move {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let version = req.version();

            let reply = handle_request(req, &dispatcher, max_body_size).await;

            info!(
                "    {} - \"{} {} {:?}\" {}",
                remote_addr,
                method,
                path,
                version,
                reply.status
            );
            Ok::<_, Infallible>(reply.into_hyper())
        }
    });

    if let Err(err) = http1::Builder::new()
        .keep_alive(config.keep_alive)
        .serve_connection(io, service)
        .await
    {
        error!("Error serving connection: {:?}", err);
    }
}

async fn handle_request(
    req: hyper::Request<Incoming>,
    dispatcher: &Dispatcher,
    max_body_size: usize,
) -> Reply {
    let (parts, body) = req.into_parts();

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|len| len.to_str().ok())
        .and_then(|len| len.parse::<usize>().ok());
    if let Some(actual) = declared.filter(|&len| len > max_body_size) {
        return payload_too_large(max_body_size, actual);
    }

    let body = match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            warn!(limit = max_body_size, "Request body exceeded limit while reading");
            return Reply::error(
                StatusCode::PAYLOAD_TOO_LARGE,
                Error::BodyLimitExceeded {
                    limit: max_body_size,
                },
            );
        }
        Err(e) => {
            error!("Failed to read request body: {}", e);
            return Reply::error(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    let inbound = Inbound {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(String::from),
        headers: parts.headers,
        body,
    };
    process_request(dispatcher, max_body_size, inbound)
}

fn payload_too_large(limit: usize, actual: usize) -> Reply {
    Reply::error(
        StatusCode::PAYLOAD_TOO_LARGE,
        Error::PayloadTooLarge { limit, actual },
    )
}

/// Core request processing logic (network agnostic)
fn process_request(dispatcher: &Dispatcher, max_body_size: usize, inbound: Inbound) -> Reply {
    let Some(kind) = request_kind(&inbound.method) else {
        return Reply::error(
            StatusCode::METHOD_NOT_ALLOWED,
            format!("Method not allowed: {}", inbound.method),
        );
    };

    if inbound.body.len() > max_body_size {
        return payload_too_large(max_body_size, inbound.body.len());
    }

    let mut request = Request::new().with_kind(kind).with_path(inbound.path);
    debug!(request_id = %request.id, kind = %kind, path = %request.path, "Parsing HTTP request");

    if let Err(e) = parse_headers(&mut request, &inbound.headers) {
        let status = match e {
            Error::UnsupportedContentType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        };
        debug!(request_id = %request.id, error = %e, "Rejected request headers");
        return Reply::error(status, e).with_request_id(&request.id);
    }

    parse_query(&mut request, inbound.query.as_deref());

    if matches!(kind, RequestKind::Push | RequestKind::Update) {
        let mut bytes = inbound.body.to_vec();
        match json::parse_object(&mut bytes) {
            Ok(data) => {
                request.payload.merge_with(&data);
            }
            Err(e) => {
                debug!(request_id = %request.id, error = %e, "Rejected request body");
                return Reply::error(StatusCode::UNPROCESSABLE_ENTITY, e)
                    .with_request_id(&request.id);
            }
        }
    }

    let mut response = Response::for_request(&request);
    if let Err(e) = dispatcher.handle(&mut request, &mut response) {
        error!(request_id = %request.id, error = %e, "Handler failed");
        return Reply::error(StatusCode::INTERNAL_SERVER_ERROR, e).with_request_id(&request.id);
    }

    info!(
        request_id = %request.id,
        status = %response.status,
        entries = response.payload.len(),
        "Request handled"
    );

    match json::to_json(&response.payload) {
        Ok(body) => Reply::json(http_status(response.status), body).with_request_id(&request.id),
        Err(e) => {
            error!(request_id = %request.id, error = %e, "Failed to serialize response");
            Reply::error(StatusCode::INTERNAL_SERVER_ERROR, e).with_request_id(&request.id)
        }
    }
}

fn parse_headers(request: &mut Request, headers: &HeaderMap) -> Result<()> {
    if matches!(request.kind, RequestKind::Push | RequestKind::Update) {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        if !mime.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
            return Err(Error::UnsupportedContentType {
                content_type: content_type.to_string(),
            });
        }
    }

    if let Some(value) = headers.get(AUTHORIZATION) {
        let text = value.to_str().unwrap_or_default();
        if !text.is_empty() {
            let token = text.strip_prefix(BEARER_PREFIX).ok_or_else(|| Error::BadRequest {
                message: format!("bad authorization token data: {text}"),
            })?;
            request.metadata.set(crate::request::TOKEN_KEY, token.trim());
        }
    }

    Ok(())
}

fn parse_query(request: &mut Request, query: Option<&str>) {
    let Some(query) = query else {
        return;
    };

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = url_decode(key);
        if key.is_empty() {
            continue;
        }
        grouped.entry(key).or_default().push(url_decode(value));
    }

    for (key, mut values) in grouped {
        debug!(request_id = %request.id, key = %key, values = ?values, "Query parameter");
        if values.len() == 1 {
            request.payload.set(key, values.remove(0));
        } else {
            request.payload.set(key, values);
        }
    }
}

fn url_decode(s: &str) -> String {
    let spaced = s.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}
