use super::SlpError;

/// The parts of an SLP service URL such as
/// `service:printer:lpr://printhost:515/queue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl {
    /// Everything before `://`, e.g. `service:printer:lpr`
    pub srv_type: String,
    pub host: String,
    /// 0 when the URL has no port
    pub port: u16,
    /// Empty for IP networks
    pub net_family: String,
    /// Remainder after host and port, including its leading `/`
    pub srv_part: String,
}

/// Parse a service URL the way `SLPParseSrvURL` does.
pub fn parse(url: &str) -> Result<ServiceUrl, SlpError> {
    let (srv_type, rest) = url
        .split_once("://")
        .ok_or_else(|| SlpError::ParseUrl(url.to_string()))?;
    if srv_type.is_empty() {
        return Err(SlpError::ParseUrl(url.to_string()));
    }

    let (host, rest) = if let Some(bracketed) = rest.strip_prefix('[') {
        let close = bracketed
            .find(']')
            .ok_or_else(|| SlpError::ParseUrl(url.to_string()))?;
        (&bracketed[..close], &bracketed[close + 1..])
    } else {
        let end = rest.find([':', '/']).unwrap_or(rest.len());
        rest.split_at(end)
    };

    let (port, srv_part) = match rest.strip_prefix(':') {
        Some(after) => {
            let end = after.find('/').unwrap_or(after.len());
            let (digits, srv_part) = after.split_at(end);
            (parse_port(digits), srv_part)
        }
        None => (0, rest),
    };

    Ok(ServiceUrl {
        srv_type: srv_type.to_string(),
        host: host.to_string(),
        port,
        net_family: String::new(),
        srv_part: srv_part.to_string(),
    })
}

/// Leading decimal digits, like `atoi`; 0 when none or out of range
fn parse_port(s: &str) -> u16 {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}
