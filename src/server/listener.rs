// Listener module
// Binds the listening socket, walks to the next port when one is taken,
// and works out the address clients should use.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use tokio::net::TcpListener;

use crate::error::ServeError;
use crate::handler::path::encode_segment;
use crate::logger;

/// Address the local IP probe pretends to talk to; nothing is ever sent
const PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(10, 255, 255, 255), 1);

/// Create a `TcpListener` on `addr` with `SO_REUSEADDR` enabled.
///
/// `SO_REUSEADDR` lets a restarted server bind over sockets left in
/// `TIME_WAIT`. `SO_REUSEPORT` stays off so a port held by another process
/// still reports `AddrInUse`.
pub fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

/// Bind the wildcard address on `port`, or on the next free port when
/// `search_free_port` is set.
///
/// At most `max_attempts` ports are tried and the search never wraps past
/// 65535. Errors other than address-in-use end the search immediately.
pub fn bind_with_fallback(
    port: u16,
    search_free_port: bool,
    max_attempts: u16,
) -> Result<TcpListener, ServeError> {
    let mut current = port;
    let mut attempts: u16 = 0;

    loop {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), current);
        let err = match create_listener(addr) {
            Ok(listener) => return Ok(listener),
            Err(e) => e,
        };
        attempts = attempts.saturating_add(1);

        if err.kind() != io::ErrorKind::AddrInUse || !search_free_port {
            logger::log_bind_failed(current, &err);
            return Err(ServeError::Bind {
                port: current,
                source: err,
            });
        }

        let next = current.checked_add(1).filter(|_| attempts < max_attempts);
        logger::log_port_in_use(current, next);
        match next {
            Some(next) => current = next,
            None => {
                return Err(ServeError::PortSearchExhausted {
                    first: port,
                    last: current,
                })
            }
        }
    }
}

/// Best-effort LAN address of this host
///
/// "Connecting" a UDP socket only selects a route, so the local endpoint it
/// reports is the interface other machines would reach. Falls back to
/// loopback when there is no route.
pub fn local_network_ip() -> IpAddr {
    usable_or_loopback(route_source_ip(PROBE_ADDR))
}

/// Local address the kernel would send from to reach `target`
fn route_source_ip(target: (Ipv4Addr, u16)) -> io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(target)?;
    Ok(socket.local_addr()?.ip())
}

fn usable_or_loopback(probed: io::Result<IpAddr>) -> IpAddr {
    match probed {
        Ok(ip) if !ip.is_unspecified() => ip,
        _ => IpAddr::V4(Ipv4Addr::LOCALHOST),
    }
}

/// URL printed at startup, pointing straight at the file for single-file shares
pub fn access_url(ip: IpAddr, port: u16, display_name: Option<&str>) -> String {
    let host = SocketAddr::new(ip, port);
    match display_name {
        Some(name) => format!("http://{host}/{}", encode_segment(name)),
        None => format!("http://{host}/"),
    }
}
