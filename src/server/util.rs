use std::net::{IpAddr, SocketAddr, UdpSocket};

use anyhow::{anyhow, Context, Result};
use tiny_http::{Header, Request, Response, ResponseBox, StatusCode};

/// Build a header from a static field name and a value
pub fn header(field: &'static str, value: &str) -> Result<Header> {
    Header::from_bytes(field.as_bytes(), value.as_bytes())
        .map_err(|_| anyhow!("Invalid header value for {field}: {value:?}"))
}

/// `Content-Disposition` header telling the client to save the body as `file_name`
pub fn attachment(file_name: &str) -> Result<Header> {
    // Quotes and backslashes would end the quoted-string early
    let escaped = file_name.replace(&['"', '\\'][..], "_");
    header(
        "Content-Disposition",
        &format!("attachment; filename=\"{escaped}\""),
    )
}

/// An empty response with the given status
pub fn empty(status: u16) -> ResponseBox {
    Response::empty(StatusCode(status)).boxed()
}

/// 303 See Other pointing the client at `location`
pub fn see_other(location: &str) -> Result<ResponseBox> {
    Ok(Response::empty(StatusCode(303))
        .with_header(header("Location", location)?)
        .boxed())
}

/// Request path without the query string
pub fn request_path(request: &Request) -> &str {
    let url = request.url();
    url.split_once('?').map_or(url, |(path, _query)| path)
}

/// Value of the first header named `field` (case-insensitive)
pub fn header_value<'r>(request: &'r Request, field: &'static str) -> Option<&'r str> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(field))
        .map(|h| h.value.as_str())
}

pub fn peer(request: &Request) -> String {
    request
        .remote_addr()
        .map_or_else(|| "unknown peer".to_owned(), SocketAddr::to_string)
}

/// Get the preferred outbound IP of this machine.
///
/// Connecting a UDP socket only selects a route, no datagram is sent.
pub fn outbound_ip() -> Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed binding UDP socket")?;
    socket
        .connect("8.8.8.8:80")
        .context("Failed determining outbound IP address")?;
    Ok(socket.local_addr()?.ip())
}

/// The address to show the operator: the outbound IP if listening on all interfaces
pub fn display_ip(listen_ip: IpAddr) -> Result<IpAddr> {
    if listen_ip.is_unspecified() {
        outbound_ip()
    } else {
        Ok(listen_ip)
    }
}
