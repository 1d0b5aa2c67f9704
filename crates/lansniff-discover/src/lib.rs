//! lansniff-discover: LAN host scanner.
//!
//! Finds live hosts on one broadcast domain with ARP (or the OS neighbor
//! table when raw sockets are unavailable), resolves each host's name through
//! a chain of strategies under a bounded worker pool, tags it with the vendor
//! of its hardware address, and renders a sorted text report.

pub mod command;
pub mod config;
pub mod error;
pub mod probe;
pub mod report;
pub mod resolve;
pub mod runtime;
pub mod scanner;
pub mod scheduler;
pub mod vendor;
