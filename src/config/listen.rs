use super::util::*;

/// Port the server listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 8003;

#[derive(Debug, Args, Clone)]
pub struct ListenArgs {
    /// Host IP e.g. `127.0.0.1`. The default listens on all interfaces.
    #[arg(long, default_value_t = String::from("0.0.0.0"), value_parser = valid_ip)]
    pub ip: String,
    /// e.g. 8003
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

fn valid_ip(ip_str: &str) -> Result<String, String> {
    if ip_str.parse::<std::net::IpAddr>().is_err() {
        return Err(format!("'{ip_str}' is not a valid IP address."));
    }
    Ok(ip_str.to_owned())
}
