use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::{anyhow, Result};
use tiny_http::Server;

use crate::{config::Config, target::ServeTarget};

use self::{handler::build_router, router::Router, util::display_ip};

pub mod handler;
pub mod router;
pub mod util;

/// Build the handlers for `target`, bind and serve until the process is stopped
pub fn listen(cfg: &Config, target: &ServeTarget) -> Result<()> {
    let ip: IpAddr = cfg.listen.ip.parse()?;
    println!("{}", target.describe());
    let router = build_router(target, &cfg.upload)?;
    let shown_ip = display_ip(ip)?;
    let server = HubServer::bind(ip, cfg.listen.port, router)?;
    let port = server.local_addr()?.port();
    println!("Serving on {shown_ip}:{port}");
    server.serve()
}

/// A bound HTTP server running one thread per request
pub struct HubServer {
    server: Server,
    router: Arc<Router>,
}

impl HubServer {
    pub fn bind(ip: IpAddr, port: u16, router: Router) -> Result<Self> {
        let server =
            Server::http((ip, port)).map_err(|e| anyhow!("Failed binding {ip}:{port}: {e}"))?;
        log::debug!("Bound to {ip}:{port}");
        Ok(Self {
            server,
            router: Arc::new(router),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.server
            .server_addr()
            .to_ip()
            .ok_or_else(|| anyhow!("Server is not listening on an IP address"))
    }

    /// Accept requests forever, each one handled on its own thread
    pub fn serve(self) -> Result<()> {
        for (n, request) in self.server.incoming_requests().enumerate() {
            let router = Arc::clone(&self.router);
            let spawned = std::thread::Builder::new()
                .name(format!("request#{n}"))
                .spawn(move || router.dispatch(request));
            if let Err(e) = spawned {
                log::error!("Failed spawning request thread: {e}");
            }
        }
        Ok(())
    }
}
