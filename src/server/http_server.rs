use super::request::parse_request;
use super::response::{into_tiny_response, status_reason};
use super::service::AppService;
use crate::dispatcher::HandlerResponse;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a worker blocks in `recv` before re-checking the stop flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// `tiny_http` server driven by a fixed pool of worker threads
pub struct HttpServer {
    service: Arc<AppService>,
    workers: usize,
}

/// Handle to a running server
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address actually bound; useful when binding port 0
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to accept connections
    ///
    /// # Errors
    ///
    /// `TimedOut` if the server is not reachable within ~250ms.
    pub fn wait_ready(&self) -> io::Result<()> {
        let probe = match self.addr.ip() {
            ip if ip.is_unspecified() => SocketAddr::from(([127, 0, 0, 1], self.addr.port())),
            _ => self.addr,
        };
        for _ in 0..50 {
            if TcpStream::connect(probe).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Signal every worker to stop and wait for them
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if self.join().is_err() {
            warn!("a server worker panicked during shutdown");
        }
    }

    /// Block until every worker exits
    ///
    /// # Errors
    ///
    /// Returns the panic payload of the first worker that panicked.
    pub fn join(self) -> thread::Result<()> {
        let mut result = Ok(());
        for worker in self.workers {
            if let Err(panic) = worker.join() {
                if result.is_ok() {
                    result = Err(panic);
                }
            }
        }
        result
    }
}

impl HttpServer {
    #[must_use]
    pub fn new(service: Arc<AppService>, workers: usize) -> Self {
        Self {
            service,
            workers: workers.max(1),
        }
    }

    /// Bind `addr` and start the workers
    ///
    /// # Errors
    ///
    /// Fails if the address is invalid or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let server = tiny_http::Server::http(addr)
            .map_err(|e| io::Error::new(io::ErrorKind::AddrNotAvailable, e.to_string()))?;
        let bound = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not an IP listener"))?;
        let server = Arc::new(server);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(self.workers);
        for n in 0..self.workers {
            let server = Arc::clone(&server);
            let service = Arc::clone(&self.service);
            let shutdown = Arc::clone(&shutdown);
            let worker = thread::Builder::new()
                .name(format!("petstore-http-{n}"))
                .spawn(move || worker_loop(&server, &service, &shutdown))?;
            workers.push(worker);
        }
        info!(addr = %bound, workers = self.workers, prefix = %self.service.prefix(), "server listening");
        Ok(ServerHandle {
            addr: bound,
            shutdown,
            workers,
        })
    }
}

fn worker_loop(server: &tiny_http::Server, service: &AppService, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::SeqCst) {
        let mut request = match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                error!(error = %e, "failed to receive request");
                continue;
            }
        };
        let response = match parse_request(&mut request) {
            Ok(parsed) => service.handle(parsed),
            Err(e) => {
                debug!(error = %e, status = e.status(), "rejecting request");
                HandlerResponse::error(e.status(), status_reason(e.status()))
            }
        };
        if let Err(e) = request.respond(into_tiny_response(response)) {
            debug!(error = %e, "client went away before the response was written");
        }
    }
}
