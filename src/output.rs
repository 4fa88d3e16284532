//! Renders a finished scan for stdout.
use crate::scanner::ScanSummary;
use itertools::Itertools;

/// Well-known services, used to label open ports in status lines.
const KNOWN_SERVICES: [(u16, &str); 22] = [
    (21, "FTP"),
    (22, "SSH"),
    (23, "Telnet"),
    (25, "SMTP"),
    (53, "DNS"),
    (80, "HTTP"),
    (110, "POP3"),
    (143, "IMAP"),
    (443, "HTTPS"),
    (465, "SMTPS"),
    (587, "SMTP (TLS)"),
    (993, "IMAPS"),
    (995, "POP3S"),
    (1433, "MSSQL"),
    (3306, "MySQL"),
    (3389, "RDP"),
    (5432, "PostgreSQL"),
    (5900, "VNC"),
    (6379, "Redis"),
    (8080, "HTTP-Alt"),
    (8443, "HTTPS-Alt"),
    (27017, "MongoDB"),
];

/// The service usually found on `port`, if it is a well-known one.
pub fn service_name(port: u16) -> Option<&'static str> {
    KNOWN_SERVICES
        .binary_search_by_key(&port, |&(known, _)| known)
        .ok()
        .map(|index| KNOWN_SERVICES[index].1)
}

/// Pretty-printed JSON with the fields `host`, `start_port`, `end_port`,
/// `open_ports` and `scan_time_ms`.
pub fn to_json(summary: &ScanSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(summary)
}

/// One line, `host -> [port,port]`, for grep and friends.
pub fn to_greppable(summary: &ScanSummary) -> String {
    format!(
        "{} -> [{}]",
        summary.host,
        summary.open_ports.iter().join(",")
    )
}

/// `port (service)` pairs for the human-readable summary line.
pub fn describe_ports(ports: &[u16]) -> String {
    ports
        .iter()
        .map(|&port| match service_name(port) {
            Some(service) => format!("{port} ({service})"),
            None => port.to_string(),
        })
        .join(", ")
}
