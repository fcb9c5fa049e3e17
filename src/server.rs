// ABOUTME: Presenter server that shows the deck in a browser and relays its input
// ABOUTME: Serves the document over HTTP and bridges view events and updates over a websocket

use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};
use tiny_http::{Header, Response, Server, StatusCode};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::mpsc;
use tungstenite::{Message, WebSocket};

use crate::config::PresentConfig;
use crate::deck::{Deck, DeckEvent};
use crate::errors::{DeckError, Result};
use crate::view::ViewUpdate;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Routes export downloads to the view that asked for the export.
///
/// Every view sees state updates, but only the requesting view saves files,
/// so several open tabs do not each download every slide.
#[derive(Debug, Default)]
struct DownloadRoute {
    next_view: AtomicU64,
    owner: AtomicU64,
}

impl DownloadRoute {
    /// Allocate an id for a new view. Ids start at 1; 0 means "no owner yet".
    fn register(&self) -> u64 {
        self.next_view.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn claim(&self, view: u64) {
        self.owner.store(view, Ordering::Relaxed);
    }

    fn delivers(&self, update: &ViewUpdate, view: u64) -> bool {
        match update {
            ViewUpdate::Download { .. } => {
                let owner = self.owner.load(Ordering::Relaxed);
                owner == 0 || owner == view
            }
            _ => true,
        }
    }
}

/// Websocket address the served page connects back to
pub fn socket_url(config: &PresentConfig) -> String {
    format!("ws://127.0.0.1:{}", config.socket_port)
}

/// Serve `html` and drive `deck` from the connected views until the process ends
pub async fn run_presenter(deck: Arc<Deck>, html: String, config: PresentConfig) -> Result<()> {
    start_http_server(html, config.port)?;

    let listener = TcpListener::bind(("127.0.0.1", config.socket_port)).map_err(|e| {
        DeckError::ServerError(format!(
            "Failed to bind websocket port {}: {}",
            config.socket_port, e
        ))
    })?;
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    start_socket_listener(listener, Arc::clone(&deck), events_tx);

    println!("Presenting on http://127.0.0.1:{} (Press Ctrl+C to stop)", config.port);

    while let Some(event) = events_rx.recv().await {
        debug!("View event: {:?}", event);
        deck.dispatch(event);
    }
    Ok(())
}

fn start_http_server(html: String, port: u16) -> Result<()> {
    let server = Server::http(("127.0.0.1", port))
        .map_err(|e| DeckError::ServerError(format!("Failed to start HTTP server: {}", e)))?;
    let content_type = Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .map_err(|_| DeckError::ServerError("Invalid content-type header".to_string()))?;

    thread::spawn(move || {
        info!("HTTP server listening on http://127.0.0.1:{}", port);
        for request in server.incoming_requests() {
            debug!("Request for {:?}", request.url());
            let response = match request.url() {
                "/" | "/index.html" => Response::from_string(html.as_str())
                    .with_header(content_type.clone()),
                _ => Response::from_string("404 Not Found").with_status_code(StatusCode(404)),
            };
            if let Err(e) = request.respond(response) {
                error!("Failed to send response: {}", e);
            }
        }
    });
    Ok(())
}

fn start_socket_listener(
    listener: TcpListener,
    deck: Arc<Deck>,
    events: mpsc::UnboundedSender<DeckEvent>,
) {
    let route = Arc::new(DownloadRoute::default());
    thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let deck = Arc::clone(&deck);
                    let events = events.clone();
                    let route = Arc::clone(&route);
                    thread::spawn(move || {
                        if let Err(e) = serve_view(stream, &deck, &events, &route) {
                            warn!("View connection closed: {}", e);
                        }
                    });
                }
                Err(e) => error!("Failed to accept view connection: {}", e),
            }
        }
    });
}

/// Pump one view connection: forward its events, push every update to it
fn serve_view(
    stream: TcpStream,
    deck: &Deck,
    events: &mpsc::UnboundedSender<DeckEvent>,
    route: &DownloadRoute,
) -> Result<()> {
    let mut socket = tungstenite::accept(stream)
        .map_err(|e| DeckError::ServerError(format!("Websocket handshake failed: {}", e)))?;
    socket.get_ref().set_read_timeout(Some(POLL_INTERVAL))?;
    let view = route.register();
    info!("View {} connected", view);

    // Subscribe before syncing so nothing published in between is missed
    let mut updates = deck.view().subscribe();
    for update in deck.sync_updates() {
        send_update(&mut socket, &update)?;
    }

    loop {
        loop {
            match updates.try_recv() {
                Ok(update) => {
                    if route.delivers(&update, view) {
                        send_update(&mut socket, &update)?;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    // State can be resynced; dropped downloads cannot.
                    warn!("View {} fell behind by {} updates, resyncing", view, skipped);
                    for update in deck.sync_updates() {
                        send_update(&mut socket, &update)?;
                    }
                    let notice = ViewUpdate::Notice {
                        message: format!(
                            "Missed {} updates; some exported slides may not have been saved",
                            skipped
                        ),
                    };
                    send_update(&mut socket, &notice)?;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => return Ok(()),
            }
        }

        match socket.read() {
            Ok(Message::Text(text)) => match serde_json::from_str::<DeckEvent>(&text) {
                Ok(event) => {
                    if matches!(event, DeckEvent::Export { .. }) {
                        route.claim(view);
                    }
                    if events.send(event).is_err() {
                        return Ok(());
                    }
                }
                Err(e) => warn!("Ignoring malformed view message {:?}: {}", text, e),
            },
            Ok(Message::Close(_)) => {
                info!("View {} disconnected", view);
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(tungstenite::Error::ConnectionClosed) => return Ok(()),
            Err(e) => {
                return Err(DeckError::ServerError(format!("Websocket read failed: {}", e)))
            }
        }
    }
}

fn send_update(socket: &mut WebSocket<TcpStream>, update: &ViewUpdate) -> Result<()> {
    let text = serde_json::to_string(update)?;
    socket
        .send(Message::Text(text))
        .map_err(|e| DeckError::ServerError(format!("Websocket write failed: {}", e)))
}
