//! iwd columnar output (`iwctl`)

use tracing::debug;

use super::{split_columns, strip_marker, table_rows};
use crate::config::IWD_RSSI_SCALE;
use crate::wifi::types::{AutoConnect, PowerState, SavedNetwork, Security, Signal, WifiDevice, WifiNetwork};

const CONNECTED_MARKER: char = '>';

/// Value next to a property name in a `Property  Value` table.
///
/// Rows may carry a leading `*` in the Settable column.
fn property_value(rows: &[String], property: &str) -> Option<String> {
    rows.iter().find_map(|row| {
        let parts = split_columns(row);
        let idx = parts.iter().position(|p| *p == property)?;
        parts.get(idx + 1).map(|v| v.to_string())
    })
}

/// Parse `iwctl device list`
pub fn parse_devices(output: &str) -> Vec<WifiDevice> {
    table_rows(output)
        .iter()
        .filter_map(|row| {
            let parts = split_columns(row);
            if parts.len() < 3 {
                debug!(row = %row, columns = parts.len(), "dropping device row: expected 3+ columns");
                return None;
            }
            let powered = match parts[2] {
                "on" => PowerState::On,
                "off" => PowerState::Off,
                _ => PowerState::Unknown,
            };
            Some(WifiDevice {
                name: parts[0].to_string(),
                address: Some(parts[1].to_string()),
                powered,
                mode: parts.get(4).map(|m| m.to_string()),
                state: None,
            })
        })
        .collect()
}

fn parse_signal(value: &str) -> Option<Signal> {
    if let Ok(raw) = value.parse::<i32>() {
        return Some(Signal::Dbm(raw / IWD_RSSI_SCALE));
    }
    // Without rssi-dbms iwctl draws up to four stars
    if !value.is_empty() && value.chars().all(|c| c == '*') {
        return Some(Signal::Percent((value.len().min(4) * 25) as u8));
    }
    None
}

/// Parse `iwctl station <dev> get-networks rssi-dbms`. BSSIDs are not part
/// of this listing and are filled in by the backend.
pub fn parse_networks(output: &str) -> Vec<WifiNetwork> {
    table_rows(output)
        .iter()
        .filter_map(|row| {
            let (rest, in_use) = strip_marker(row, CONNECTED_MARKER);
            let parts = split_columns(rest);
            if parts.len() < 3 {
                debug!(row = %row, columns = parts.len(), "dropping network row: expected 3 columns");
                return None;
            }
            let Some(signal) = parse_signal(parts[2]) else {
                debug!(row = %row, value = parts[2], "dropping network row: bad signal");
                return None;
            };
            Some(WifiNetwork {
                ssid: parts[0].to_string(),
                bssid: None,
                security: Security::from_label(parts[1]),
                signal,
                in_use,
            })
        })
        .collect()
}

/// Parse `iwctl known-networks list`.
///
/// Three columns are name, security, last connected; four columns carry the
/// Hidden flag between security and last connected.
pub fn parse_known_networks(output: &str) -> Vec<SavedNetwork> {
    table_rows(output)
        .iter()
        .filter_map(|row| {
            let parts = split_columns(row);
            let (hidden, last_used) = match parts.len() {
                2 => (false, None),
                3 => (false, Some(parts[2])),
                4 => (parts[2] == "yes", Some(parts[3])),
                n => {
                    debug!(row = %row, columns = n, "dropping known-network row");
                    return None;
                }
            };
            Some(SavedNetwork {
                name: parts[0].to_string(),
                security: Some(Security::from_label(parts[1])),
                hidden,
                last_used: last_used.map(str::to_string),
                auto_connect: AutoConnect::Unknown,
            })
        })
        .collect()
}

/// Connected network name from `iwctl station <dev> show`
pub fn parse_station_show(output: &str) -> Option<String> {
    let rows = table_rows(output);
    if property_value(&rows, "State").as_deref() == Some("disconnected") {
        return None;
    }
    property_value(&rows, "Connected network").filter(|name| !name.is_empty())
}

/// AutoConnect flag from `iwctl known-networks <name> show`
pub fn parse_known_network_autoconnect(output: &str) -> AutoConnect {
    let rows = table_rows(output);
    property_value(&rows, "AutoConnect")
        .map(|v| AutoConnect::from_flag(&v))
        .unwrap_or(AutoConnect::Unknown)
}

fn is_mac(token: &str) -> bool {
    token.len() == 17
        && token.split(':').count() == 6
        && token
            .split(':')
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()))
}

/// First BSSID in `iwctl station <dev> get-bsses <ssid>`
pub fn parse_bssid(output: &str) -> Option<String> {
    table_rows(output)
        .iter()
        .flat_map(|row| row.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .find(|token| is_mac(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = "
                                    Devices
--------------------------------------------------------------------------------
  Name                  Address               Powered     Adapter     Mode
--------------------------------------------------------------------------------
  wlan0                 aa:bb:cc:dd:ee:ff     on          phy0        station
";

    const NETWORKS: &str = "
                               Available networks
--------------------------------------------------------------------------------
      Network name                      Security            Signal
--------------------------------------------------------------------------------
\x1b[0m  > \x1b[0m  Home                              psk                 -4500
      Coffee Shop                       open                -7200
      Campus                            8021x               -6100
";

    const KNOWN: &str = "
                               Known Networks
--------------------------------------------------------------------------------
  Name                              Security     Hidden    Last connected
--------------------------------------------------------------------------------
  Home                              psk                    Oct 16, 10:12 AM
  Lab                               psk          yes       Oct 10, 8:00 PM
";

    #[test]
    fn parses_device() {
        let devices = parse_devices(DEVICES);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "wlan0");
        assert_eq!(devices[0].address.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(devices[0].powered, PowerState::On);
        assert_eq!(devices[0].mode.as_deref(), Some("station"));
    }

    #[test]
    fn parses_networks_with_marker() {
        let networks = parse_networks(NETWORKS);
        assert_eq!(networks.len(), 3);
        assert!(networks[0].in_use);
        assert_eq!(networks[0].ssid, "Home");
        assert_eq!(networks[0].signal, Signal::Dbm(-45));
        assert_eq!(networks[1].ssid, "Coffee Shop");
        assert_eq!(networks[1].security, Security::Open);
        assert!(!networks[1].in_use);
        assert_eq!(networks[2].security, Security::Enterprise);
    }

    #[test]
    fn star_signal_without_rssi_dbms() {
        let out = "
  Available networks
--------------------
  Network name  Security  Signal
--------------------
  Home          psk       ***
";
        assert_eq!(parse_networks(out)[0].signal, Signal::Percent(75));
    }

    #[test]
    fn no_networks_is_empty() {
        let out = "
                               Available networks
--------------------------------------------------------------------------------
      Network name                      Security            Signal
--------------------------------------------------------------------------------
      No networks available
";
        assert!(parse_networks(out).is_empty());
    }

    #[test]
    fn known_networks_hidden_column() {
        let known = parse_known_networks(KNOWN);
        assert_eq!(known.len(), 2);
        assert_eq!(known[0].name, "Home");
        assert!(!known[0].hidden);
        assert_eq!(known[0].last_used.as_deref(), Some("Oct 16, 10:12 AM"));
        assert_eq!(known[0].auto_connect, AutoConnect::Unknown);
        assert_eq!(known[1].name, "Lab");
        assert!(known[1].hidden);
    }

    #[test]
    fn station_show_connected() {
        let out = "
                                 Station: wlan0
--------------------------------------------------------------------------------
  Settable  Property              Value
--------------------------------------------------------------------------------
            Scanning              no
            State                 connected
            Connected network     Home
            IPv4 address          192.168.1.20
";
        assert_eq!(parse_station_show(out).as_deref(), Some("Home"));
    }

    #[test]
    fn station_show_disconnected() {
        let out = "
                                 Station: wlan0
--------------------------------------------------------------------------------
  Settable  Property              Value
--------------------------------------------------------------------------------
            Scanning              no
            State                 disconnected
";
        assert_eq!(parse_station_show(out), None);
    }

    #[test]
    fn autoconnect_property() {
        let out = "
                           Known Network: Home
--------------------------------------------------------------------------------
  Settable  Property              Value
--------------------------------------------------------------------------------
            Name                  Home
            Security              psk
       *    AutoConnect           no
";
        assert_eq!(parse_known_network_autoconnect(out), AutoConnect::No);
    }

    #[test]
    fn autoconnect_missing_is_unknown() {
        assert_eq!(parse_known_network_autoconnect(""), AutoConnect::Unknown);
        assert_eq!(
            parse_known_network_autoconnect("Known Network: Home\n----\nProperty  Value\n----\n  Name  Home\n"),
            AutoConnect::Unknown
        );
    }

    #[test]
    fn bssid_from_bss_listing() {
        let out = "
                           Available BSSes for Home
--------------------------------------------------------------------------------
      BSSID               Frequency  Signal
--------------------------------------------------------------------------------
      11:22:33:44:55:66   5180       -4500
      11:22:33:44:55:77   2412       -7000
";
        assert_eq!(parse_bssid(out).as_deref(), Some("11:22:33:44:55:66"));
        assert_eq!(parse_bssid("nothing here"), None);
    }
}
