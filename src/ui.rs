use serde::Serialize;
use std::collections::BTreeSet;

use crate::config::IconSet;
use crate::wifi::dispatcher::NetworkView;
use crate::wifi::{AnnotatedNetwork, AutoConnect, PowerState, SavedNetwork};

const BAR_WIDTH: usize = 10;

fn signal_bar(quality: u8) -> String {
    let filled = (quality as usize / 10).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn auto_icon(auto_connect: AutoConnect, icons: IconSet) -> &'static str {
    match auto_connect {
        AutoConnect::Yes => icons.auto_on(),
        AutoConnect::No => icons.auto_off(),
        AutoConnect::Unknown => icons.auto_unknown(),
    }
}

/// One scan row: status icons, name, signal and security
pub fn network_line(entry: &AnnotatedNetwork, favorite: bool, icons: IconSet) -> String {
    let network = &entry.network;
    let prefix = if entry.saved {
        icons.saved()
    } else if network.security.is_secured() {
        icons.locked()
    } else {
        icons.open()
    };

    let mut name = format!("{prefix}{}", network.display_name());
    if favorite {
        name = format!("{}{name}", icons.favorite());
    }
    if entry.current {
        name.push_str(icons.connected());
    }
    if entry.saved {
        name = format!("{name} {}", auto_icon(entry.auto_connect, icons));
    }

    format!(
        "{name:<40} {} {:>8}  {}",
        signal_bar(network.signal.quality()),
        network.signal.to_string(),
        network.security
    )
}

pub fn render_networks(networks: &[AnnotatedNetwork], favorites: &BTreeSet<String>, icons: IconSet) -> String {
    if networks.is_empty() {
        return "No networks found".to_string();
    }
    networks
        .iter()
        .map(|n| network_line(n, favorites.contains(&n.network.ssid), icons))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_saved(saved: &[SavedNetwork], icons: IconSet) -> String {
    if saved.is_empty() {
        return "No saved networks".to_string();
    }
    saved
        .iter()
        .map(|s| {
            let security = s.security.map(|sec| sec.to_string()).unwrap_or_else(|| "-".into());
            let hidden = if s.hidden { " (hidden)" } else { "" };
            format!(
                "{}{:<32} {} {:<10} {}{hidden}",
                icons.saved(),
                s.name,
                auto_icon(s.auto_connect, icons),
                security,
                s.last_used.as_deref().unwrap_or("never"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_status(view: &NetworkView, favorite: bool, icons: IconSet) -> String {
    let Some(device) = &view.device else {
        return "No Wi-Fi device found".to_string();
    };
    let power = match device.powered {
        PowerState::On => "on",
        PowerState::Off => "off",
        PowerState::Unknown => "unknown",
    };
    let mut lines = vec![format!("Device:    {}", device.name)];
    if let Some(address) = &device.address {
        lines.push(format!("Address:   {address}"));
    }
    lines.push(format!("Radio:     {power}"));
    if let Some(state) = &device.state {
        lines.push(format!("State:     {state}"));
    }
    match &view.current {
        Some(current) => {
            let mark = if favorite { icons.favorite() } else { "" };
            lines.push(format!("Connected: {mark}{}", current.network_name));
            if let Some(entry) = view.networks.iter().find(|n| n.current) {
                lines.push(format!("Signal:    {}", entry.network.signal));
            }
        }
        None => lines.push("Connected: -".to_string()),
    }
    lines.join("\n")
}

pub fn render_favorites(favorites: &BTreeSet<String>, icons: IconSet) -> String {
    if favorites.is_empty() {
        return "No favorite networks".to_string();
    }
    favorites
        .iter()
        .map(|ssid| format!("{}{ssid}", icons.favorite()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Serialize)]
struct NetworkRow<'a> {
    #[serde(flatten)]
    entry: &'a AnnotatedNetwork,
    favorite: bool,
}

pub fn networks_json(networks: &[AnnotatedNetwork], favorites: &BTreeSet<String>) -> serde_json::Result<String> {
    let rows: Vec<_> = networks
        .iter()
        .map(|entry| NetworkRow {
            entry,
            favorite: favorites.contains(&entry.network.ssid),
        })
        .collect();
    serde_json::to_string_pretty(&rows)
}

pub fn saved_json(saved: &[SavedNetwork]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(saved)
}
