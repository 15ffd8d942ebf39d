//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed map of paths to bodies. Individual paths can be set to fail
//! with 503 a number of times before succeeding; every request is counted.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Routes {
    bodies: HashMap<String, Vec<u8>>,
    failures_left: HashMap<String, u32>,
    hits: HashMap<String, u32>,
}

/// Handle to a running server. The server runs until the process exits.
#[derive(Clone)]
pub struct SegmentServer {
    base: String,
    routes: Arc<Mutex<Routes>>,
}

impl SegmentServer {
    /// Starts a server in a background thread with no routes.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(Mutex::new(Routes::default()));
        let shared = Arc::clone(&routes);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &routes));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}/", port),
            routes,
        }
    }

    /// Absolute URL for `path` (no leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn serve(&self, path: &str, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .bodies
            .insert(format!("/{}", path), body.into());
    }

    /// Answer the next `times` requests for `path` with 503.
    pub fn fail(&self, path: &str, times: u32) {
        self.routes
            .lock()
            .unwrap()
            .failures_left
            .insert(format!("/{}", path), times);
    }

    pub fn hits(&self, path: &str) -> u32 {
        let routes = self.routes.lock().unwrap();
        routes.hits.get(&format!("/{}", path)).copied().unwrap_or(0)
    }
}

fn handle(mut stream: TcpStream, routes: &Mutex<Routes>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/").to_string();

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    let (status, body) = {
        let mut routes = routes.lock().unwrap();
        *routes.hits.entry(path.clone()).or_insert(0) += 1;
        let failing = match routes.failures_left.get_mut(&path) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        };
        if failing {
            ("503 Service Unavailable", Vec::new())
        } else {
            match routes.bodies.get(&path) {
                Some(b) => ("200 OK", b.clone()),
                None => ("404 Not Found", Vec::new()),
            }
        }
    };

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}
