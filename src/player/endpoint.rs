//! Local configuration endpoint for the indicator colours.
//!
//! Serves one HTML form and accepts its submission as a GET query. The six
//! values are matched by field name (`value1` .. `value6`) after URL
//! decoding. A request line that is too short, is not a `GET ... HTTP/1.1`
//! request, lacks any of the six fields or carries a value outside 0..=255 is
//! ignored as a whole: nothing is persisted and the client still gets the
//! form back.
//!
//! Clients are accepted without waiting on the navigation activity and each
//! one is served to completion by an axum router on a throwaway
//! current-thread runtime, so the activity is blocked for at most one
//! connection and never longer than the client timeout.

use axum::Router;
use axum::extract::{OriginalUri, State};
use axum::http::{Method, Version, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::serve::Listener;
use log::{debug, error, info, warn};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::Notify;

use super::colors::ColorConfig;
use crate::constants::{COLOR_FIELDS, MIN_CONFIG_REQUEST_LEN};
use crate::error::ConfigRequestError;
use crate::hal::PersistentStore;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(2);
const FIELD_PREFIX: &str = "value";

/// Parse a request line carrying the six colour fields.
pub fn parse_color_request(line: &str) -> Result<ColorConfig, ConfigRequestError> {
    if line.len() <= MIN_CONFIG_REQUEST_LEN {
        return Err(ConfigRequestError::TooShort(line.len()));
    }

    let mut parts = line.split(' ');
    let (Some("GET"), Some(target), Some("HTTP/1.1"), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ConfigRequestError::NotGetRequest);
    };

    let (_, query) = target
        .split_once('?')
        .ok_or(ConfigRequestError::MissingQuery)?;

    let mut fields: [Option<u8>; COLOR_FIELDS] = [None; COLOR_FIELDS];
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        let Some(slot) = field_slot(&key) else {
            continue;
        };
        let value = decode_component(value);
        let parsed = value
            .trim()
            .parse::<u8>()
            .map_err(|_| ConfigRequestError::InvalidValue {
                field: key.clone(),
                value: value.clone(),
            })?;
        fields[slot] = Some(parsed);
    }

    let mut bytes = [0u8; COLOR_FIELDS];
    for (i, field) in fields.iter().enumerate() {
        bytes[i] = field.ok_or_else(|| {
            ConfigRequestError::MissingField(format!("{FIELD_PREFIX}{}", i + 1))
        })?;
    }
    Ok(ColorConfig::from_bytes(bytes))
}

/// `value1` .. `value6` map to slots 0..6
fn field_slot(key: &str) -> Option<usize> {
    let n: usize = key.strip_prefix(FIELD_PREFIX)?.parse().ok()?;
    (1..=COLOR_FIELDS).contains(&n).then(|| n - 1)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// The form page body
pub fn form_page() -> String {
    let mut page = String::new();
    page.push_str("<!DOCTYPE html><html>\r\n");
    page.push_str("<head><title>wavdeck colours</title></head>\r\n");
    page.push_str("<body><h1>Enter values</h1>\r\n");
    page.push_str("<form action=\"/submit\" method=\"GET\">\r\n");
    for i in 1..=COLOR_FIELDS {
        page.push_str(&format!(
            "Value {i}: <input type=\"number\" name=\"{FIELD_PREFIX}{i}\" min=\"0\" max=\"255\"><br>\r\n"
        ));
    }
    page.push_str("<input type=\"submit\" value=\"Submit\"></form>\r\n");
    page.push_str("</body></html>\r\n");
    page
}

/// Rebuild the request line the way it arrived on the wire
pub fn request_line(method: &Method, uri: &axum::http::Uri, version: Version) -> String {
    format!("{method} {uri} {version:?}")
}

/// What one connection submitted
#[derive(Clone, Default)]
struct FormState {
    submitted: Arc<Mutex<Option<ColorConfig>>>,
}

impl FormState {
    fn take(&self) -> Option<ColorConfig> {
        self.submitted.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Every path and method gets the form; a valid submission is kept for the
/// caller to persist once the connection is done.
async fn serve_form(
    State(state): State<FormState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    version: Version,
) -> Response {
    let line = request_line(&method, &uri, version);
    match parse_color_request(&line) {
        Ok(colors) => {
            if let Ok(mut slot) = state.submitted.lock() {
                *slot = Some(colors);
            }
        }
        Err(reason) => debug!("Ignoring '{line}': {reason}"),
    }

    (
        [
            (header::CONTENT_TYPE, "text/html"),
            (header::CONNECTION, "close"),
        ],
        form_page(),
    )
        .into_response()
}

fn router(state: FormState) -> Router {
    Router::new()
        .route("/", any(serve_form))
        .route("/submit", any(serve_form))
        .fallback(serve_form)
        .with_state(state)
}

/// An accepted client that signals when the connection lets go of it
struct ClientStream {
    stream: tokio::net::TcpStream,
    closed: Arc<Notify>,
}

impl Drop for ClientStream {
    fn drop(&mut self) {
        self.closed.notify_one();
    }
}

impl AsyncRead for ClientStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for ClientStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

/// Hands the one accepted client to `axum::serve`, then never yields again
struct SingleClient {
    client: Option<(ClientStream, SocketAddr)>,
    local: SocketAddr,
}

impl Listener for SingleClient {
    type Io = ClientStream;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match self.client.take() {
            Some(client) => client,
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(self.local)
    }
}

pub struct ConfigEndpoint {
    listener: TcpListener,
    client_timeout: Duration,
}

impl ConfigEndpoint {
    pub fn bind(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("Configuration endpoint on http://{}/", listener.local_addr()?);
        Ok(Self {
            listener,
            client_timeout: CLIENT_TIMEOUT,
        })
    }

    /// Longest time one client may hold the navigation activity
    pub fn with_client_timeout(mut self, timeout: Duration) -> Self {
        self.client_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve a waiting client, if there is one, and persist what it
    /// submitted. Never waits for a client to connect, but blocks while
    /// serving one.
    pub fn poll(&self, store: &mut dyn PersistentStore) -> io::Result<Option<ColorConfig>> {
        let (stream, peer) = match self.listener.accept() {
            Ok(client) => client,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e),
        };
        info!("Configuration client {peer}");

        let submitted = self.serve_client(stream, peer)?;
        debug!("Configuration client {peer} disconnected");

        let Some(colors) = submitted else {
            return Ok(None);
        };
        match colors.persist(store) {
            Ok(()) => Ok(Some(colors)),
            Err(e) => {
                error!("Could not persist colours: {e}");
                Ok(None)
            }
        }
    }

    fn serve_client(&self, stream: TcpStream, peer: SocketAddr) -> io::Result<Option<ColorConfig>> {
        stream.set_nonblocking(true)?;
        let local = self.listener.local_addr()?;
        let state = FormState::default();
        let app = router(state.clone());
        let timeout = self.client_timeout;

        // Dropping the runtime afterwards also drops a client that timed out
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(async move {
            let closed = Arc::new(Notify::new());
            let client = ClientStream {
                stream: tokio::net::TcpStream::from_std(stream)?,
                closed: closed.clone(),
            };
            let listener = SingleClient {
                client: Some((client, peer)),
                local,
            };
            let server = axum::serve(listener, app)
                .with_graceful_shutdown(async move { closed.notified().await });

            match tokio::time::timeout(timeout, server.into_future()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Configuration client {peer} timed out");
                    Ok(())
                }
            }
        })?;

        Ok(state.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryEeprom;
    use std::io::{Read, Write};
    use std::thread;
    use std::time::Instant;

    const VALID: &str =
        "GET /submit?value1=10&value2=20&value3=30&value4=40&value5=50&value6=60 HTTP/1.1";

    /// Connect, send `request` and collect the reply on another thread
    fn send(endpoint: &ConfigEndpoint, request: Vec<u8>) -> thread::JoinHandle<Vec<u8>> {
        let mut client = TcpStream::connect(endpoint.local_addr().unwrap()).unwrap();
        thread::spawn(move || {
            client.write_all(&request).unwrap();
            let mut response = Vec::new();
            let _ = client.read_to_end(&mut response);
            response
        })
    }

    fn stored_bytes(store: &MemoryEeprom) -> Vec<u8> {
        (0..COLOR_FIELDS).map(|a| store.read(a).unwrap()).collect()
    }

    #[test]
    fn test_parse_valid_request() {
        assert!(VALID.len() > MIN_CONFIG_REQUEST_LEN);
        let colors = parse_color_request(VALID).unwrap();
        assert_eq!(colors.to_bytes(), [10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_parse_matches_fields_by_name() {
        let line =
            "GET /submit?value6=60&value5=50&value4=40&value3=30&value2=20&value1=10 HTTP/1.1";
        let colors = parse_color_request(line).unwrap();
        assert_eq!(colors.to_bytes(), [10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_parse_decodes_components() {
        let line = "GET /submit?value%31=1&value2=+2&value3=3&value4=4&value5=5&value6=6&x=%20 HTTP/1.1";
        let colors = parse_color_request(line).unwrap();
        assert_eq!(colors.to_bytes(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let line = "GET /submit?value1=1&value2=2 HTTP/1.1";
        assert_eq!(
            parse_color_request(line),
            Err(ConfigRequestError::TooShort(line.len()))
        );
    }

    #[test]
    fn test_parse_rejects_wrong_envelope() {
        let post = VALID.replacen("GET", "PUT", 1);
        assert_eq!(
            parse_color_request(&post),
            Err(ConfigRequestError::NotGetRequest)
        );

        let old = VALID.replace("HTTP/1.1", "HTTP/1.0");
        assert_eq!(
            parse_color_request(&old),
            Err(ConfigRequestError::NotGetRequest)
        );
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let line = "GET /submit?value1=10&value2=20&value3=30&value4=40&value5=50&other=60 HTTP/1.1";
        assert_eq!(
            parse_color_request(line),
            Err(ConfigRequestError::MissingField("value6".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_out_of_range_value() {
        let line = "GET /submit?value1=300&value2=20&value3=30&value4=40&value5=50&value6=60 HTTP/1.1";
        assert!(matches!(
            parse_color_request(line),
            Err(ConfigRequestError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_field_slot() {
        assert_eq!(field_slot("value1"), Some(0));
        assert_eq!(field_slot("value6"), Some(5));
        assert_eq!(field_slot("value7"), None);
        assert_eq!(field_slot("value0"), None);
        assert_eq!(field_slot("colour1"), None);
    }

    #[test]
    fn test_form_page_has_six_fields() {
        let page = form_page();
        for i in 1..=6 {
            assert!(page.contains(&format!("name=\"value{i}\"")));
        }
        assert!(!page.contains("name=\"value7\""));
    }

    #[test]
    fn test_request_line_round_trips() {
        let uri: axum::http::Uri = "/submit?value1=10&value2=20&value3=30&value4=40&value5=50&value6=60"
            .parse()
            .unwrap();
        assert_eq!(request_line(&Method::GET, &uri, Version::HTTP_11), VALID);
    }

    #[test]
    fn test_poll_persists_submission() {
        let endpoint = ConfigEndpoint::bind("127.0.0.1:0").unwrap();
        let mut store = MemoryEeprom::new();
        let client = send(&endpoint, format!("{VALID}\r\nHost: 192.168.4.1\r\n\r\n").into_bytes());

        let persisted = endpoint.poll(&mut store).unwrap();
        assert_eq!(persisted.map(|c| c.to_bytes()), Some([10, 20, 30, 40, 50, 60]));
        assert_eq!(stored_bytes(&store), vec![10, 20, 30, 40, 50, 60]);
        assert_eq!(store.commits(), 1);

        let response = String::from_utf8_lossy(&client.join().unwrap()).into_owned();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("<form"));
    }

    #[test]
    fn test_form_request_changes_nothing() {
        let endpoint = ConfigEndpoint::bind("127.0.0.1:0").unwrap();
        let mut store = MemoryEeprom::new();
        ColorConfig::from_bytes([1, 1, 1, 2, 2, 2])
            .persist(&mut store)
            .unwrap();
        let client = send(&endpoint, b"GET / HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n".to_vec());

        assert!(endpoint.poll(&mut store).unwrap().is_none());
        assert_eq!(stored_bytes(&store), vec![1, 1, 1, 2, 2, 2]);
        assert!(String::from_utf8_lossy(&client.join().unwrap()).contains("<form"));
    }

    #[test]
    fn test_non_utf8_header_still_gets_form() {
        let endpoint = ConfigEndpoint::bind("127.0.0.1:0").unwrap();
        let mut store = MemoryEeprom::new();
        let client = send(&endpoint, b"GET / HTTP/1.1\r\nUser-Agent: caf\xe9\r\n\r\n".to_vec());

        assert!(endpoint.poll(&mut store).unwrap().is_none());
        let response = client.join().unwrap();
        assert!(String::from_utf8_lossy(&response).contains("<form"));
    }

    #[test]
    fn test_endless_request_line_is_cut_off() {
        let endpoint = ConfigEndpoint::bind("127.0.0.1:0")
            .unwrap()
            .with_client_timeout(Duration::from_millis(200));
        let mut store = MemoryEeprom::new();
        let mut client = TcpStream::connect(endpoint.local_addr().unwrap()).unwrap();
        let trickle = thread::spawn(move || {
            let _ = client.write_all(b"GET /submit?value1=");
            for _ in 0..60 {
                if client.write_all(b"1").is_err() {
                    break;
                }
                thread::sleep(Duration::from_millis(20));
            }
        });

        let started = Instant::now();
        assert!(endpoint.poll(&mut store).unwrap().is_none());
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(store.commits(), 0);
        trickle.join().unwrap();
    }

    #[test]
    fn test_poll_without_client() {
        let endpoint = ConfigEndpoint::bind("127.0.0.1:0").unwrap();
        let mut store = MemoryEeprom::new();
        assert!(endpoint.poll(&mut store).unwrap().is_none());
    }
}
