//! A link that degrades while traffic flows.
//!
//! Starts with a clean link and turns up loss and latency every few
//! datagrams, showing that a [`LinkProfile`] can be tuned mid-run.

use std::{net::UdpSocket, time::Duration};

use wanem::{LinkProfile, SimpleModel, WanEmulator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let sender = UdpSocket::bind("127.0.0.1:0")?;
    let receiver = UdpSocket::bind("127.0.0.1:0")?;
    receiver.set_read_timeout(Some(Duration::from_millis(500)))?;

    let profile = LinkProfile::pristine();
    let mut emulator = WanEmulator::new(
        "127.0.0.1:0".parse()?,
        sender.local_addr()?,
        receiver.local_addr()?,
        SimpleModel::new(profile.clone()),
    );
    emulator.start()?;
    let link = emulator.local_addr().expect("emulator is running");

    let mut buf = [0u8; 64];
    for round in 0u64..4 {
        println!(
            "round {round}: loss {:.0}%, delay {} ms",
            profile.loss() * 100.0,
            profile.delay_ms()
        );
        let mut delivered = 0;
        for seq in 0u8..10 {
            sender.send_to(&[seq], link)?;
            if receiver.recv_from(&mut buf).is_ok() {
                delivered += 1;
            }
        }
        println!("  delivered {delivered}/10");

        profile.set_loss(profile.loss() + 0.2);
        profile.set_delay_ms(profile.delay_ms() + 50);
    }

    emulator.stop()?;
    Ok(())
}
