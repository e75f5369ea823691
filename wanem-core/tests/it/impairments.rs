use std::time::Duration;

use wanem_core::{LinkProfile, SimpleModel, WanEmulator};

use crate::util::{addr_of, assert_silent, peer, recv_up_to, send_paced, wait_for};

fn started(profile: LinkProfile, seed: u64) -> (WanEmulator, std::net::UdpSocket, std::net::UdpSocket) {
    let _ = tracing_subscriber::fmt::try_init();
    let peer_a = peer();
    let peer_b = peer();
    let mut emulator = WanEmulator::new(
        "127.0.0.1:0".parse().unwrap(),
        addr_of(&peer_a),
        addr_of(&peer_b),
        SimpleModel::with_seed(profile, seed),
    );
    emulator.start().unwrap();
    (emulator, peer_a, peer_b)
}

#[test]
fn full_loss_is_a_sink() {
    let (emulator, peer_a, peer_b) = started(LinkProfile::new(1.0, 0.0, 0, 0), 42);
    let emulator_addr = emulator.local_addr().unwrap();

    send_paced(&peer_a, emulator_addr, (0u8..100).map(|i| vec![i]));

    // the reactor consumed everything and dropped everything
    assert!(
        wait_for(Duration::from_secs(2), || emulator.stats().policy_drops() == 100),
        "expected 100 policy drops, saw {}",
        emulator.stats().policy_drops()
    );
    assert_eq!(emulator.stats().packets_tx(), 0);
    assert_silent(&peer_b, Duration::from_millis(200));
}

#[test]
fn jitter_reorders_but_loses_nothing() {
    let (emulator, peer_a, peer_b) = started(LinkProfile::new(0.0, 0.0, 0, 50), 42);
    let emulator_addr = emulator.local_addr().unwrap();

    let bodies: Vec<Vec<u8>> = (0u16..200).map(|i| i.to_be_bytes().to_vec()).collect();
    send_paced(&peer_a, emulator_addr, bodies.clone());

    let received = recv_up_to(&peer_b, bodies.len(), Duration::from_secs(10));
    assert_eq!(received.len(), bodies.len());

    // same multiset of payloads, order free to differ
    let mut expected = bodies;
    let mut actual = received;
    expected.sort();
    actual.sort();
    assert_eq!(actual, expected);
}

#[test]
fn duplication_delivers_at_least_once() {
    let (emulator, peer_a, peer_b) = started(LinkProfile::new(0.0, 0.5, 0, 0), 42);
    let emulator_addr = emulator.local_addr().unwrap();

    peer_a.send_to(b"copy", emulator_addr).unwrap();

    let copies = recv_up_to(&peer_b, usize::MAX, Duration::from_millis(600));
    assert!(!copies.is_empty(), "zero-loss link must deliver at least one copy");
    assert!(copies.iter().all(|body| body == b"copy"));
    assert_eq!(emulator.stats().packets_rx(), 1);
    assert_eq!(emulator.stats().packets_tx(), copies.len());
}

#[test]
fn zero_loss_never_drops() {
    let (emulator, peer_a, peer_b) = started(LinkProfile::new(0.0, 0.03, 0, 0), 7);
    let emulator_addr = emulator.local_addr().unwrap();

    send_paced(&peer_a, emulator_addr, (0u8..50).map(|i| vec![i]));

    let received = recv_up_to(&peer_b, usize::MAX, Duration::from_millis(800));
    assert!(received.len() >= 50, "got {} datagrams for 50 sent", received.len());
    assert_eq!(emulator.stats().policy_drops(), 0);
}

#[test]
fn lossy_link_stats_add_up() {
    let (emulator, peer_a, peer_b) = started(LinkProfile::new(0.5, 0.0, 0, 0), 1234);
    let emulator_addr = emulator.local_addr().unwrap();

    send_paced(&peer_a, emulator_addr, (0u8..100).map(|i| vec![i]));

    // every datagram ends up either sent or dropped once the burst settles
    assert!(
        wait_for(Duration::from_secs(2), || {
            let stats = emulator.stats();
            stats.packets_tx() + stats.policy_drops() == 100
        }),
        "reactor did not settle the burst"
    );
    let _ = recv_up_to(&peer_b, emulator.stats().packets_tx(), Duration::from_secs(2));

    let stats = emulator.stats();
    assert_eq!(stats.packets_rx(), 100);
    assert_eq!(stats.packets_tx() + stats.policy_drops(), 100);
    // 50% loss over 100 trials stays far from both extremes
    assert!(stats.policy_drops() > 20 && stats.policy_drops() < 80);
}
