use std::cmp::Ordering;

use crate::wifi::types::{AnnotatedNetwork, AutoConnect, CurrentConnection, SavedNetwork, WifiNetwork};

/// Annotate scan results with saved and current state, sorted for display.
///
/// The parser's in-use flag wins whenever any scanned network carries it.
/// Only when none does is the current connection name used, and then only
/// the strongest access point with that SSID is marked.
pub fn merge(
    scan: Vec<WifiNetwork>,
    saved: &[SavedNetwork],
    current: Option<&CurrentConnection>,
) -> Vec<AnnotatedNetwork> {
    let parser_flagged = scan.iter().any(|n| n.in_use);

    let fallback_index = if parser_flagged {
        None
    } else {
        current.and_then(|c| {
            scan.iter()
                .enumerate()
                .filter(|(_, n)| !n.ssid.is_empty() && n.ssid == c.network_name)
                .max_by_key(|(_, n)| n.signal.quality())
                .map(|(i, _)| i)
        })
    };

    let mut merged: Vec<AnnotatedNetwork> = scan
        .into_iter()
        .enumerate()
        .map(|(i, network)| {
            let saved_entry = saved
                .iter()
                .find(|s| !network.ssid.is_empty() && s.name == network.ssid);
            let current = if parser_flagged {
                network.in_use
            } else {
                fallback_index == Some(i)
            };
            AnnotatedNetwork {
                saved: saved_entry.is_some(),
                auto_connect: saved_entry
                    .map(|s| s.auto_connect)
                    .unwrap_or(AutoConnect::Unknown),
                current,
                network,
            }
        })
        .collect();

    merged.sort_by(display_order);
    merged
}

/// Current first, then strongest signal, then SSID
fn display_order(a: &AnnotatedNetwork, b: &AnnotatedNetwork) -> Ordering {
    b.current
        .cmp(&a.current)
        .then_with(|| b.network.signal.quality().cmp(&a.network.signal.quality()))
        .then_with(|| a.network.ssid.cmp(&b.network.ssid))
}
