//! A throwaway HTTP server for exercising the API client.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const MATCHES_JSON: &str = r#"{
  "matches": {
    "previous": [
      {
        "date": "2022-04-23T18:00:00.000Z",
        "description": "Team Cool Eagles vs. Team Red Dragons",
        "home": "Team Cool Eagles",
        "away": "Team Red Dragons",
        "winner": "Team Red Dragons",
        "highlights": "https://example.com/highlights/1.mp4"
      },
      {
        "date": "2022-04-24T18:00:00.000+0000",
        "description": "Team Chill Elephants vs. Team Cool Eagles",
        "home": "Team Chill Elephants",
        "away": "Team Cool Eagles",
        "winner": "Team Cool Eagles",
        "highlights": "https://example.com/highlights/2.mp4"
      }
    ],
    "upcoming": [
      {
        "date": "2030-08-13T20:00:00.000Z",
        "description": "Team Red Dragons vs. Team Chill Elephants",
        "home": "Team Red Dragons",
        "away": "Team Chill Elephants"
      }
    ]
  }
}"#;

pub const TEAMS_JSON: &str = r#"{
  "teams": [
    {"id": "767ec50c-7fdb-4c3d-98f9-d6727ef8252b", "name": "Team Red Dragons",
     "logo": "https://example.com/logos/red.png"},
    {"id": "7b4d8114-742b-4410-971a-500162375cae", "name": "Team Cool Eagles",
     "logo": "https://example.com/logos/eagles.png"},
    {"id": "efe6d30b-b3d0-4a8b-9f2c-6fce5a33b2a3", "name": "Team Chill Elephants"}
  ]
}"#;

#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
}

/// Serves canned responses by request path; unknown paths get a 404.
pub struct TestServer {
    addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, Reply>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<Mutex<HashMap<String, Reply>>> = Arc::default();
        let requests: Arc<Mutex<Vec<String>>> = Arc::default();

        let (task_routes, task_requests) = (Arc::clone(&routes), Arc::clone(&requests));
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&task_routes);
                let requests = Arc::clone(&task_requests);
                tokio::spawn(async move { respond(stream, routes, requests).await });
            }
        });

        Self {
            addr,
            routes,
            requests,
        }
    }

    pub fn route(&self, path: &str, status: u16, body: &str) -> &Self {
        self.routes.lock().unwrap().insert(
            path.to_string(),
            Reply {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines seen so far, e.g. `GET /teams HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn respond(
    mut stream: TcpStream,
    routes: Arc<Mutex<HashMap<String, Reply>>>,
    requests: Arc<Mutex<Vec<String>>>,
) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }

    let head = String::from_utf8_lossy(&head).to_string();
    let request_line = head.lines().next().unwrap_or_default().to_string();
    let path = request_line.split_whitespace().nth(1).unwrap_or("/").to_string();
    requests.lock().unwrap().push(request_line);

    let reply = routes.lock().unwrap().get(&path).cloned().unwrap_or(Reply {
        status: 404,
        body: r#"{"message": "Not Found"}"#.to_string(),
    });
    let response = format!(
        "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
