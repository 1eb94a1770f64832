// src/origin/mod.rs
// Origin server: the authoritative backing store. Resolves `GET
// <resource>/<key>` against `<data_dir>/<resource><key>.json` and answers
// OK or NOT_FOUND. No caching, no state.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::wire::{self, OriginResponse, Request, Status};

pub struct OriginServer {
    data_dir: PathBuf,
}

impl OriginServer {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Accept loop: one spawned task per connection.
    pub async fn run(self: Arc<Self>, listener: TcpListener) -> anyhow::Result<()> {
        info!("origin serving {:?} on {}", self.data_dir, listener.local_addr()?);
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = self.clone();
            tokio::spawn(async move {
                if let Err(err) = server.handle_connection(stream).await {
                    warn!(%peer, %err, "connection error");
                }
            });
        }
    }

    async fn handle_connection(&self, mut stream: TcpStream) -> std::io::Result<()> {
        let line = match wire::read_request_line(&mut stream).await? {
            Some(line) => line,
            None => return Ok(()),
        };

        let response = match Request::parse(&line) {
            Ok(Request::Get { resource, key }) => self.lookup(&resource, &key).await,
            Ok(Request::Metrics) => OriginResponse {
                status: Status::BadRequest,
                data: Some("METRICS is not served by the origin".into()),
            },
            Err(Error::WrongMethod(m)) => OriginResponse {
                status: Status::WrongMethod,
                data: Some(format!("{m} is not currently supported").into()),
            },
            Err(err) => OriginResponse {
                status: Status::BadRequest,
                data: Some(err.to_string().into()),
            },
        };

        let body = serde_json::to_string(&response)
            .unwrap_or_else(|_| r#"{"status":"NOT_FOUND","data":null}"#.to_string());
        wire::write_line(&mut stream, &body).await
    }

    /// Black-box key lookup: a missing or unreadable file is NOT_FOUND.
    async fn lookup(&self, resource: &str, key: &str) -> OriginResponse {
        let path = self.data_dir.join(format!("{resource}{key}.json"));
        debug!(?path, "origin lookup");

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(data) => OriginResponse {
                    status: Status::Ok,
                    data: Some(data),
                },
                Err(err) => {
                    warn!(?path, %err, "unparseable data file");
                    OriginResponse {
                        status: Status::NotFound,
                        data: None,
                    }
                }
            },
            Err(_) => OriginResponse {
                status: Status::NotFound,
                data: None,
            },
        }
    }
}
