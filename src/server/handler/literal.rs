use tiny_http::{Request, Response, ResponseBox};

use crate::server::router::Handler;

/// Answers every request with the same text
pub struct ServeString {
    text: String,
}

impl ServeString {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

impl Handler for ServeString {
    fn handle(&self, _request: &mut Request) -> anyhow::Result<ResponseBox> {
        Ok(Response::from_string(self.text.as_str()).boxed())
    }
}
