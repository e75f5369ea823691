//! Ping-pong through an impaired link.
//!
//! Binds two local peers and an emulator, then measures per-datagram
//! round trips while loss and latency are applied.

use std::{
    net::UdpSocket,
    time::{Duration, Instant},
};

use wanem::{LinkProfile, SimpleModel, WanEmulator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let client = UdpSocket::bind("127.0.0.1:0")?;
    let server = UdpSocket::bind("127.0.0.1:0")?;
    client.set_read_timeout(Some(Duration::from_secs(1)))?;
    server.set_read_timeout(Some(Duration::from_secs(1)))?;

    // 5% loss, 80 ± 30 ms one-way latency
    let profile = LinkProfile::new(0.05, 0.0, 80, 30);
    let mut emulator = WanEmulator::new(
        "127.0.0.1:0".parse()?,
        client.local_addr()?,
        server.local_addr()?,
        SimpleModel::new(profile),
    );
    emulator.start()?;
    let link = emulator.local_addr().expect("emulator is running");
    println!("relaying {} <-> {} via {link}", client.local_addr()?, server.local_addr()?);

    // echo server: bounce every datagram back through the emulator
    std::thread::spawn(move || {
        let mut buf = [0u8; 1500];
        while let Ok((n, _)) = server.recv_from(&mut buf) {
            let _ = server.send_to(&buf[..n], link);
        }
    });

    let mut buf = [0u8; 1500];
    for seq in 0u32..20 {
        let sent_at = Instant::now();
        client.send_to(&seq.to_be_bytes(), link)?;
        match client.recv_from(&mut buf) {
            Ok((n, _)) if n == 4 => {
                let echoed = u32::from_be_bytes(buf[..4].try_into()?);
                println!("seq {echoed:>2} rtt {:>5.1} ms", sent_at.elapsed().as_secs_f64() * 1000.0);
            }
            Ok(_) => println!("seq {seq:>2} short reply"),
            Err(_) => println!("seq {seq:>2} lost"),
        }
    }

    let stats = emulator.stats();
    println!(
        "relayed {} of {} datagrams ({} dropped by the link model)",
        stats.packets_tx(),
        stats.packets_rx(),
        stats.policy_drops(),
    );

    emulator.stop()?;
    Ok(())
}
