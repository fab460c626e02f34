use crate::model::ForageModel;
use anyhow::Result;
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use tiny_http::{Header, Method, Request, Response, Server};

const BANNER: &str = "Forage simulation server running";

/// A response produced by [`route`], independent of the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Reply { status, content_type: "text/plain; charset=utf-8", body: body.to_string() }
    }
}

/// Maps one request onto the model. `GET /step` advances the model (unless finished)
/// and returns the resulting snapshot.
pub fn route(model: &mut ForageModel, method: &Method, url: &str) -> Reply {
    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        (Method::Get, "/step") => {
            if !model.is_finished() {
                model.step();
            }
            match model.snapshot().to_json() {
                Ok(body) => Reply { status: 200, content_type: "application/json", body },
                Err(e) => {
                    error!("Failed to serialize snapshot: {}", e);
                    Reply::text(500, "snapshot serialization failed")
                }
            }
        }
        (Method::Get, "/") => Reply::text(200, BANNER),
        (_, "/step") | (_, "/") => Reply::text(405, "method not allowed"),
        _ => Reply::text(404, "not found"),
    }
}

/// Serves the model over HTTP, one request at a time.
pub struct StepServer {
    server: Server,
    model: ForageModel,
    finish_logged: bool,
}

impl StepServer {
    pub fn bind(addr: &str, model: ForageModel) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| anyhow::anyhow!("Failed to bind simulation server to '{}': {}", addr, e))?;
        Ok(Self { server, model, finish_logged: false })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    #[cfg(test)]
    pub fn model(&self) -> &ForageModel {
        &self.model
    }

    /// Serves requests until the listener shuts down.
    pub fn serve(&mut self) -> Result<()> {
        loop {
            self.handle_one()?;
        }
    }

    /// Blocks for the next request and answers it.
    pub fn handle_one(&mut self) -> Result<()> {
        let request = self.server.recv()?;
        self.respond(request);
        Ok(())
    }

    fn respond(&mut self, request: Request) {
        let reply = route(&mut self.model, request.method(), request.url());
        debug!("{} {} -> {}", request.method(), request.url(), reply.status);

        if self.model.is_finished() && !self.finish_logged {
            info!(
                "Simulation finished after {} steps ({} deliveries).",
                self.model.steps(),
                self.model.delivered()
            );
            self.finish_logged = true;
        }

        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
            response = response.with_header(header);
        }
        if let Err(e) = request.respond(response) {
            warn!("Failed to send response: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forage_common::{EngineConfig, Snapshot};
    use std::thread;

    fn model() -> ForageModel {
        ForageModel::new(&EngineConfig::default()).unwrap()
    }

    #[test]
    fn step_route_advances_and_returns_snapshot() {
        let mut model = model();
        let reply = route(&mut model, &Method::Get, "/step");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "application/json");
        assert_eq!(model.steps(), 1);

        let snap = Snapshot::from_json(&reply.body).unwrap();
        assert_eq!(snap, model.snapshot());
        assert_eq!(snap.agents.len(), 5);

        let _ = route(&mut model, &Method::Get, "/step?client=viewer");
        assert_eq!(model.steps(), 2);
    }

    #[test]
    fn finished_model_is_not_stepped() {
        let config = EngineConfig::from_toml_str(
            "[world]\nwidth = 4\nheight = 4\nbase_x = 0\nbase_y = 0\nfood_count = 1\n[agents]\ncount = 1\n",
        )
        .unwrap();
        let mut model = ForageModel::new(&config).unwrap();
        while !model.is_finished() {
            assert!(model.steps() < 100_000);
            model.step();
        }
        let steps = model.steps();
        let reply = route(&mut model, &Method::Get, "/step");
        assert_eq!(model.steps(), steps);
        assert!(Snapshot::from_json(&reply.body).unwrap().finished);
    }

    #[test]
    fn other_routes() {
        let mut model = model();
        let reply = route(&mut model, &Method::Get, "/");
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, BANNER);
        assert_eq!(route(&mut model, &Method::Post, "/step").status, 405);
        assert_eq!(route(&mut model, &Method::Get, "/reset").status, 404);
        assert_eq!(model.steps(), 0);
    }

    #[test]
    fn serves_step_over_http() {
        let mut server = StepServer::bind("127.0.0.1:0", model()).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || {
            for _ in 0..2 {
                server.handle_one().unwrap();
            }
            server.model().steps()
        });

        let url = format!("http://{}/step", addr);
        let first = ureq::get(&url).call().unwrap().into_string().unwrap();
        let second = ureq::get(&url).call().unwrap().into_string().unwrap();
        let steps = handle.join().unwrap();

        assert_eq!(steps, 2);
        assert!(!Snapshot::from_json(&first).unwrap().finished);
        assert_eq!(Snapshot::from_json(&second).unwrap().agents.len(), 5);
    }
}
