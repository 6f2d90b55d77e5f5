//! Stub HTTP servers standing in for the remote APIs.
//!
//! Each test binds a server on an ephemeral local port and installs a handler
//! closure that answers every request with a synthetic status, body and
//! headers. Requests never leave the machine.
#![allow(dead_code, reason = "each test binary uses a different subset")]

pub mod catalog_stub;
pub mod rate_limit_stub;

use bytes::Bytes;
use http_body_util::{BodyExt as _, Full};
use hyper::{Request, Response, StatusCode, body::Incoming, server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use std::io::ErrorKind;
use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// Shared handler invoked for each request with its body already collected.
pub type Handler =
    Arc<Mutex<Box<dyn FnMut(&Request<Bytes>) -> Response<Full<Bytes>> + Send>>>;

/// Handle returned by [`start_stub`] for shutting the server down.
pub struct ShutdownHandle {
    join: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl ShutdownHandle {
    /// Signal the server to stop and await shutdown.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.join.await;
    }
}

/// Start a stub server answering 404 until a handler is installed.
///
/// # Errors
///
/// Returns an error if the server fails to bind to a local port.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! uses % internally"
)]
pub async fn start_stub() -> Result<(SocketAddr, Handler, ShutdownHandle), std::io::Error> {
    let handler: Handler = Arc::new(Mutex::new(Box::new(|_req| {
        text_response(StatusCode::NOT_FOUND, "No handler")
    })));
    let handler_clone = Arc::clone(&handler);

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (tx, mut rx) = oneshot::channel();

    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                res = listener.accept() => match res {
                    Ok((stream, _)) => {
                        let io = TokioIo::new(stream);
                        let h = Arc::clone(&handler_clone);
                        let service = service_fn(move |req: Request<Incoming>| {
                            let h = Arc::clone(&h);
                            async move {
                                let (parts, body) = req.into_parts();
                                let bytes = body.collect().await.unwrap_or_default().to_bytes();
                                let req = Request::from_parts(parts, bytes);
                                let resp = {
                                    let mut f = h.lock().expect("lock handler in service");
                                    (f)(&req)
                                };
                                Ok::<_, Infallible>(resp)
                            }
                        });
                        tokio::spawn(async move {
                            let _ = http1::Builder::new().serve_connection(io, service).await;
                        });
                    }
                    Err(e) => {
                        eprintln!("accept error: {e}");
                        match e.kind() {
                            ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                            | ErrorKind::Interrupted
                            | ErrorKind::WouldBlock => {}
                            _ => break,
                        }
                    }
                },
                _ = &mut rx => break,
            }
        }
    });

    Ok((addr, handler, ShutdownHandle { join, stop: tx }))
}

/// Replace the handler of a running stub.
pub fn set_handler<F>(handler: &Handler, f: F)
where
    F: FnMut(&Request<Bytes>) -> Response<Full<Bytes>> + Send + 'static,
{
    *handler.lock().expect("lock handler") = Box::new(f);
}

/// Serve `body` as JSON with `status` for every request, like a fulfilled
/// interception.
pub fn fulfil(handler: &Handler, status: StatusCode, body: serde_json::Value) {
    set_handler(handler, move |_req| json_response(status, &body));
}

/// Base URL of a stub bound at `addr`.
pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{addr}")
}

pub fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Full::from(body.to_string()))
        .expect("build response")
}

pub fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(Full::from(body))
        .expect("build response")
}

/// Route the `log` output of the harness through the test capture.
pub fn init_logging() {
    apicheck::logging::init_for_tests();
}
