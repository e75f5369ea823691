use std::{
    io,
    net::{SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Binds a blocking peer socket on loopback with a receive timeout.
pub fn peer() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind peer");
    socket.set_read_timeout(Some(RECV_TIMEOUT)).expect("set timeout");
    socket
}

pub fn addr_of(socket: &UdpSocket) -> SocketAddr {
    socket.local_addr().expect("local addr")
}

/// Receives one datagram, returning its payload and source.
pub fn recv(socket: &UdpSocket) -> (Vec<u8>, SocketAddr) {
    let mut buf = [0u8; 2048];
    let (n, from) = socket.recv_from(&mut buf).expect("recv datagram");
    (buf[..n].to_vec(), from)
}

/// Asserts that nothing arrives on `socket` within `window`.
pub fn assert_silent(socket: &UdpSocket, window: Duration) {
    socket.set_read_timeout(Some(window)).expect("set timeout");
    let mut buf = [0u8; 2048];
    match socket.recv_from(&mut buf) {
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
        Ok((n, from)) => panic!("unexpected datagram of {n} bytes from {from}"),
        Err(e) => panic!("unexpected recv error: {e}"),
    }
    socket.set_read_timeout(Some(RECV_TIMEOUT)).expect("restore timeout");
}

/// Collects datagrams until `count` arrived or `deadline` elapsed.
pub fn recv_up_to(socket: &UdpSocket, count: usize, deadline: Duration) -> Vec<Vec<u8>> {
    let started = Instant::now();
    let mut bodies = Vec::new();
    let mut buf = [0u8; 2048];
    while bodies.len() < count && started.elapsed() < deadline {
        socket
            .set_read_timeout(Some(Duration::from_millis(100)))
            .expect("set timeout");
        if let Ok((n, _)) = socket.recv_from(&mut buf) {
            bodies.push(buf[..n].to_vec());
        }
    }
    socket.set_read_timeout(Some(RECV_TIMEOUT)).expect("restore timeout");
    bodies
}

/// Sends `bodies` from `src` to `dst` with light pacing, so loopback
/// bursts do not overrun socket buffers.
pub fn send_paced(src: &UdpSocket, dst: SocketAddr, bodies: impl IntoIterator<Item = Vec<u8>>) {
    for body in bodies {
        src.send_to(&body, dst).expect("send datagram");
        std::thread::sleep(Duration::from_micros(300));
    }
}

/// Waits until `predicate` holds or the window elapses; returns whether it
/// held. For polling emulator stats without a fixed sleep.
pub fn wait_for(window: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let started = Instant::now();
    while started.elapsed() < window {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}
