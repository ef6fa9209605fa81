//! NetworkManager tabular output (`nmcli` without `-t`)

use tracing::debug;

use super::{split_columns, strip_marker};
use crate::wifi::types::{
    AutoConnect, CurrentConnection, PowerState, SavedNetwork, Security, Signal, WifiDevice,
    WifiNetwork,
};

const IN_USE_MARKER: char = '*';

fn is_wifi_type(kind: &str) -> bool {
    kind == "wifi" || kind == "802-11-wireless"
}

/// Data rows: skip the column header and blank lines
fn data_rows(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|l| !l.trim().is_empty()).skip(1)
}

/// Parse `nmcli device wifi list`
///
/// Columns: IN-USE BSSID SSID MODE CHAN RATE SIGNAL BARS SECURITY. The
/// IN-USE column is either `*` or blank, so it is stripped before splitting.
pub fn parse_wifi_list(output: &str) -> Vec<WifiNetwork> {
    data_rows(output)
        .filter_map(|line| {
            let (row, in_use) = strip_marker(line, IN_USE_MARKER);
            let parts = split_columns(row);
            if parts.len() != 8 {
                debug!(row = line, columns = parts.len(), "dropping wifi row: expected exactly 8 columns");
                return None;
            }

            let signal = match parts[5].parse::<u8>() {
                Ok(signal) => signal,
                Err(_) => {
                    debug!(row = line, value = parts[5], "dropping wifi row: bad signal");
                    return None;
                }
            };

            let ssid = match parts[1] {
                "--" => String::new(),
                ssid => ssid.to_string(),
            };
            let bssid = parts[0].to_string();

            Some(WifiNetwork {
                ssid,
                bssid: Some(bssid),
                security: Security::from_label(parts[7]),
                signal: Signal::Percent(signal),
                in_use,
            })
        })
        .collect()
}

/// Parse `nmcli -f NAME,UUID,TYPE,AUTOCONNECT,TIMESTAMP connection show`,
/// keeping Wi-Fi profiles only
pub fn parse_saved_connections(output: &str) -> Vec<SavedNetwork> {
    data_rows(output)
        .filter_map(|line| {
            let parts = split_columns(line);
            if parts.len() < 4 {
                debug!(row = line, columns = parts.len(), "dropping connection row: expected 4+ columns");
                return None;
            }
            if !is_wifi_type(parts[2]) {
                return None;
            }

            let last_used = parts
                .get(4)
                .filter(|ts| **ts != "0" && **ts != "--")
                .map(|ts| ts.to_string());

            Some(SavedNetwork {
                name: parts[0].to_string(),
                security: None,
                hidden: false,
                last_used,
                auto_connect: AutoConnect::from_flag(parts[3]),
            })
        })
        .collect()
}

/// Parse `nmcli device status` for the first Wi-Fi device
pub fn parse_wifi_device(output: &str) -> Option<WifiDevice> {
    data_rows(output).find_map(|line| {
        let parts = split_columns(line);
        if parts.len() < 3 || parts[1] != "wifi" {
            return None;
        }
        let state = parts[2];
        let powered = match state {
            "unavailable" => PowerState::Off,
            "unmanaged" => PowerState::Unknown,
            _ => PowerState::On,
        };
        Some(WifiDevice {
            name: parts[0].to_string(),
            address: None,
            powered,
            mode: Some(parts[1].to_string()),
            state: Some(state.to_string()),
        })
    })
}

/// Parse `nmcli -f NAME,UUID,TYPE,DEVICE connection show --active`
pub fn parse_current_connection(output: &str) -> Option<CurrentConnection> {
    data_rows(output).find_map(|line| {
        let parts = split_columns(line);
        if parts.len() < 4 || !is_wifi_type(parts[2]) {
            return None;
        }
        Some(CurrentConnection {
            network_name: parts[0].to_string(),
            device_name: parts[3].to_string(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIFI_LIST: &str = "\
IN-USE  BSSID              SSID         MODE   CHAN  RATE        SIGNAL  BARS  SECURITY
*       AA:BB:CC:DD:EE:01  Home         Infra  36    540 Mbit/s  82      ▂▄▆█  WPA2 WPA3
        AA:BB:CC:DD:EE:02  Coffee Shop  Infra  6     130 Mbit/s  47      ▂▄__  --
        AA:BB:CC:DD:EE:03  --           Infra  11    65 Mbit/s   20      ▂___  WPA2
        AA:BB:CC:DD:EE:04  Campus       Infra  1     270 Mbit/s  60      ▂▄▆_  WPA2 802.1X
";

    #[test]
    fn parses_every_well_formed_row() {
        let networks = parse_wifi_list(WIFI_LIST);
        assert_eq!(networks.len(), 4);
        for n in &networks {
            assert!(!n.ssid.is_empty() || n.bssid.is_some());
        }
    }

    #[test]
    fn in_use_marker_and_fields() {
        let networks = parse_wifi_list(WIFI_LIST);
        let home = &networks[0];
        assert!(home.in_use);
        assert_eq!(home.ssid, "Home");
        assert_eq!(home.bssid.as_deref(), Some("AA:BB:CC:DD:EE:01"));
        assert_eq!(home.signal, Signal::Percent(82));
        assert_eq!(home.security, Security::Psk);

        assert!(!networks[1].in_use);
        assert_eq!(networks[1].ssid, "Coffee Shop");
        assert_eq!(networks[1].security, Security::Open);
        assert_eq!(networks[3].security, Security::Enterprise);
    }

    #[test]
    fn hidden_ssid_is_empty() {
        let networks = parse_wifi_list(WIFI_LIST);
        assert_eq!(networks[2].ssid, "");
        assert_eq!(networks[2].display_name(), "Hidden Network");
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let out = "\
IN-USE  BSSID              SSID  MODE   CHAN  RATE        SIGNAL  BARS  SECURITY
        AA:BB:CC:DD:EE:01  Home  Infra  36    540 Mbit/s  high    ▂▄▆█  WPA2
garbage
        AA:BB:CC:DD:EE:02  Cafe  Infra  6     130 Mbit/s  47      ▂▄__  --
";
        let networks = parse_wifi_list(out);
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid, "Cafe");
    }

    #[test]
    fn rows_with_extra_columns_are_dropped() {
        // A split BARS cell shifts SECURITY one column to the right
        let out = "\
IN-USE  BSSID              SSID  MODE   CHAN  RATE        SIGNAL  BARS  SECURITY
        AA:BB:CC:DD:EE:01  Home  Infra  36    540 Mbit/s  82      ▂▄  ▆█  WPA2
        AA:BB:CC:DD:EE:02  Cafe  Infra  6     130 Mbit/s  47      ▂▄__  --
";
        let networks = parse_wifi_list(out);
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid, "Cafe");
    }

    #[test]
    fn header_only_is_empty() {
        assert!(parse_wifi_list("IN-USE  BSSID  SSID  MODE  CHAN  RATE  SIGNAL  BARS  SECURITY").is_empty());
        assert!(parse_wifi_list("").is_empty());
    }

    #[test]
    fn saved_connections_keep_wifi_only() {
        let out = "\
NAME                UUID                                  TYPE      AUTOCONNECT  TIMESTAMP
Home                0b8e2a64-2d3c-4c2f-9a4e-8f2b5d1e7c11  wifi      yes          1760600000
Wired connection 1  5c7d9a2e-1b3f-4e6a-8c9d-0a1b2c3d4e5f  ethernet  yes          0
Office              7a6b5c4d-3e2f-1a0b-9c8d-7e6f5a4b3c2d  wifi      no           0
";
        let saved = parse_saved_connections(out);
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].name, "Home");
        assert_eq!(saved[0].auto_connect, AutoConnect::Yes);
        assert_eq!(saved[0].last_used.as_deref(), Some("1760600000"));
        assert_eq!(saved[1].name, "Office");
        assert_eq!(saved[1].auto_connect, AutoConnect::No);
        assert_eq!(saved[1].last_used, None);
    }

    #[test]
    fn device_status_picks_wifi() {
        let out = "\
DEVICE         TYPE      STATE         CONNECTION
enp3s0         ethernet  connected     Wired connection 1
wlan0          wifi      connected     Home
p2p-dev-wlan0  wifi-p2p  disconnected  --
lo             loopback  unmanaged     --
";
        let device = parse_wifi_device(out).unwrap();
        assert_eq!(device.name, "wlan0");
        assert_eq!(device.powered, PowerState::On);
        assert_eq!(device.state.as_deref(), Some("connected"));
    }

    #[test]
    fn radio_off_device_is_unpowered() {
        let out = "\
DEVICE  TYPE  STATE        CONNECTION
wlan0   wifi  unavailable  --
";
        assert_eq!(parse_wifi_device(out).unwrap().powered, PowerState::Off);
    }

    #[test]
    fn current_connection_skips_non_wifi() {
        let out = "\
NAME                UUID                                  TYPE      DEVICE
Wired connection 1  5c7d9a2e-1b3f-4e6a-8c9d-0a1b2c3d4e5f  ethernet  enp3s0
Home                0b8e2a64-2d3c-4c2f-9a4e-8f2b5d1e7c11  wifi      wlan0
";
        let current = parse_current_connection(out).unwrap();
        assert_eq!(current.network_name, "Home");
        assert_eq!(current.device_name, "wlan0");
    }

    #[test]
    fn no_active_wifi_is_none() {
        let out = "NAME  UUID  TYPE  DEVICE\nlo  1234  loopback  lo\n";
        assert!(parse_current_connection(out).is_none());
    }
}
