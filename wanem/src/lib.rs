#![doc(issue_tracker_base_url = "https://github.com/chainbound/wanem/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! A userspace UDP WAN emulator.
//!
//! `wanem` sits between two UDP peers and relays their datagrams through
//! a configurable impairment model — latency, jitter, loss and
//! duplication — so application code can be exercised against realistic
//! wide-area behavior without a dedicated test network. Point both peers
//! at the emulator's address instead of at each other:
//!
//! ```no_run
//! use wanem::{LinkProfile, SimpleModel, WanEmulator};
//!
//! // a flaky intercontinental link: 10% loss, 175 ± 75 ms latency
//! let profile = LinkProfile::default();
//! let mut emulator = WanEmulator::new(
//!     "127.0.0.1:4000".parse().unwrap(),
//!     "127.0.0.1:4001".parse().unwrap(),
//!     "127.0.0.1:4002".parse().unwrap(),
//!     SimpleModel::new(profile.clone()),
//! );
//!
//! emulator.start().unwrap();
//! profile.set_delay_ms(300); // parameters are live-tunable
//! emulator.stop().unwrap();
//! ```
//!
//! Custom impairment behavior plugs in through
//! [`ImpairmentModel`], one method invoked per ingress datagram.

pub use wanem_core::*;
