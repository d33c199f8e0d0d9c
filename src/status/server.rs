//! Status endpoint: `GET /status` returns the latest control snapshot as JSON.
//! Runs on its own thread; reads never block the control loop beyond the snapshot clone.

use std::io;
use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info};

use crate::control::types::ControlSnapshot;
use crate::status::publisher::SnapshotPublisher;

/// What to send back for one request, decided without touching the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Json(String),
    NotFound,
    InternalError,
}

/// Match on the path only; HEAD is answered like GET (tiny_http drops the body).
pub fn route(method: &Method, url: &str, snapshot: &ControlSnapshot) -> Reply {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (Method::Get | Method::Head, "/status") => match serde_json::to_string(snapshot) {
            Ok(json) => Reply::Json(json),
            Err(err) => {
                error!("Could not serialize status snapshot: {}", err);
                Reply::InternalError
            }
        },
        _ => Reply::NotFound,
    }
}

fn respond(request: Request, reply: Reply) -> io::Result<()> {
    match reply {
        Reply::Json(json) => {
            let response = match Header::from_bytes("Content-Type", "application/json") {
                Ok(header) => Response::from_string(json).with_header(header),
                Err(()) => Response::from_string(json),
            };
            request.respond(response)
        }
        Reply::NotFound => {
            request.respond(Response::from_string("404").with_status_code(StatusCode(404)))
        }
        Reply::InternalError => {
            request.respond(Response::from_string("500").with_status_code(StatusCode(500)))
        }
    }
}

/// Serve requests until the server socket shuts down.
pub fn serve(server: Server, publisher: SnapshotPublisher) {
    for request in server.incoming_requests() {
        debug!("Status request: {:?} {}", request.method(), request.url());

        let reply = route(request.method(), request.url(), &publisher.latest());
        if let Err(err) = respond(request, reply) {
            // Keep serving other clients
            error!("Could not write status response: {}", err);
        }
    }

    error!("Status server socket has shut down");
}

/// Bind `address` and serve from a dedicated thread.
pub fn start(address: &str, publisher: SnapshotPublisher) -> Result<JoinHandle<()>> {
    let server = Server::http(address)
        .map_err(|err| anyhow!("could not start status server at {}: {}", address, err))?;

    info!("Status endpoint listening at http://{}/status", address);

    std::thread::Builder::new()
        .name("status-server".to_string())
        .spawn(move || serve(server, publisher))
        .context("Failed to spawn status server thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::types::SnapshotStatus;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    fn ready_snapshot() -> ControlSnapshot {
        ControlSnapshot {
            highest_board_temp: Some(45.0),
            mean_fan_speed: 4000,
            gpu_temp: Some(50),
            status: SnapshotStatus::Ok,
        }
    }

    #[test]
    fn test_route_status() {
        match route(&Method::Get, "/status", &ready_snapshot()) {
            Reply::Json(json) => {
                let value: serde_json::Value = serde_json::from_str(&json).unwrap();
                assert_eq!(value["highest_sensor_temp"], 45.0);
                assert_eq!(value["mean_fan_speed"], 4000);
                assert_eq!(value["gpu_temp"], 50);
                assert_eq!(value["status"], "OK");
            }
            other => panic!("expected JSON reply, got {:?}", other),
        }
    }

    #[test]
    fn test_route_rejects_other_paths_and_methods() {
        let snapshot = ControlSnapshot::initial();
        assert_eq!(route(&Method::Get, "/", &snapshot), Reply::NotFound);
        assert_eq!(route(&Method::Get, "/status/extra", &snapshot), Reply::NotFound);
        assert_eq!(route(&Method::Post, "/status", &snapshot), Reply::NotFound);
        assert_eq!(route(&Method::Get, "/statusx?a=1", &snapshot), Reply::NotFound);
    }

    #[test]
    fn test_route_ignores_query_string() {
        let snapshot = ready_snapshot();
        assert!(matches!(route(&Method::Get, "/status?x=1", &snapshot), Reply::Json(_)));
        assert!(matches!(route(&Method::Get, "/status?", &snapshot), Reply::Json(_)));
        assert!(matches!(route(&Method::Head, "/status", &snapshot), Reply::Json(_)));
    }

    fn http_request(addr: std::net::SocketAddr, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        write!(stream, "{} {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", method, path).unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    fn http_get(addr: std::net::SocketAddr, path: &str) -> String {
        http_request(addr, "GET", path)
    }

    #[test]
    fn test_live_server_serves_latest_snapshot() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let publisher = SnapshotPublisher::new();
        let reader = publisher.clone();
        std::thread::spawn(move || serve(server, reader));

        let waiting = http_get(addr, "/status");
        assert!(waiting.starts_with("HTTP/1.1 200"));
        assert!(waiting.contains(r#""status":"waiting_for_sensors""#));
        assert!(waiting.contains(r#""gpu_temp":null"#));

        publisher.publish(ready_snapshot());
        let ready = http_get(addr, "/status");
        assert!(ready.contains(r#""status":"OK""#));
        assert!(ready.contains(r#""mean_fan_speed":4000"#));

        let missing = http_get(addr, "/metrics");
        assert!(missing.starts_with("HTTP/1.1 404"));
    }

    #[test]
    fn test_live_server_answers_query_and_head() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let publisher = SnapshotPublisher::new();
        publisher.publish(ready_snapshot());
        let reader = publisher.clone();
        std::thread::spawn(move || serve(server, reader));

        let with_query = http_get(addr, "/status?ts=1");
        assert!(with_query.starts_with("HTTP/1.1 200"));
        assert!(with_query.contains(r#""status":"OK""#));

        let head = http_request(addr, "HEAD", "/status");
        assert!(head.starts_with("HTTP/1.1 200"));
        assert!(!head.contains(r#""status":"OK""#));
    }
}
