use tiny_http::{Request, ResponseBox};

use super::util::{empty, peer, request_path};

/// Turns one request into one response.
///
/// Implementations hold only immutable state, they are shared by every request thread.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &mut Request) -> anyhow::Result<ResponseBox>;
}

/// Exact path routes with a catch-all handler for every other path
pub struct Router {
    routes: Vec<(&'static str, Box<dyn Handler>)>,
    fallback: Box<dyn Handler>,
}

impl Router {
    pub fn new<H: Handler + 'static>(fallback: H) -> Self {
        Self {
            routes: Vec::new(),
            fallback: Box::new(fallback),
        }
    }

    #[must_use]
    pub fn route<H: Handler + 'static>(mut self, path: &'static str, handler: H) -> Self {
        self.routes.push((path, Box::new(handler)));
        self
    }

    fn find(&self, path: &str) -> &dyn Handler {
        self.routes
            .iter()
            .find(|(route, _)| *route == path)
            .map_or(&*self.fallback, |(_, handler)| &**handler)
    }

    /// Run the matching handler and send its response.
    ///
    /// A failing handler is answered with an empty 500.
    pub fn dispatch(&self, mut request: Request) {
        let peer = peer(&request);
        log::debug!("{} {} from {peer}", request.method(), request.url());

        let handler = self.find(request_path(&request));
        let response = match handler.handle(&mut request) {
            Ok(response) => response,
            Err(e) => {
                log::error!("{} {} from {peer} failed: {e:#}", request.method(), request.url());
                empty(500)
            }
        };
        tracing::trace!("Responding with {}", response.status_code().0);
        if let Err(e) = request.respond(response) {
            log::warn!("Failed responding to {peer}: {e}");
        }
    }
}
