//! Bridge link registration and dispatch
//!
//! This module lists the links compiled into the binary and opens a
//! [`Bridge`] from a link string such as `serial:dev=/dev/ttyUSB0:115200`.

use zedspi_bridge::{Bridge, Channel, Timing};

/// Boxed bridge, independent of the link type
pub type AnyBridge = Bridge<Box<dyn Channel>>;

/// Information about a bridge link
pub struct BridgeInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available links (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_bridges() -> Vec<BridgeInfo> {
    let mut bridges = Vec::new();

    #[cfg(feature = "serial")]
    bridges.push(BridgeInfo {
        name: "serial",
        aliases: &["uart"],
        description: "Bridge firmware on a serial port (dev=<port>[:baud])",
    });

    #[cfg(feature = "dummy")]
    bridges.push(BridgeInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory firmware emulator for testing",
    });

    bridges
}

/// Get a comma-separated list of link names
pub fn bridge_names_short() -> String {
    let bridges = available_bridges();
    let names: Vec<&str> = bridges.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Check if a link name matches any available link
pub fn find_bridge(name: &str) -> Option<&'static str> {
    available_bridges()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Open a bridge from a link string
///
/// The link string is the link name, optionally followed by parameters
/// (e.g. "dummy" or "serial:dev=/dev/ttyUSB0:115200").
pub fn open_bridge(link: &str, timing: Timing) -> Result<AnyBridge, Box<dyn std::error::Error>> {
    let (name, options) = parse_bridge_string(link);

    let canonical_name = find_bridge(name).ok_or_else(|| unknown_bridge_error(name))?;

    let channel: Box<dyn Channel> = match canonical_name {
        #[cfg(feature = "serial")]
        "serial" => {
            use zedspi_bridge::{SerialChannel, SerialOptions};

            let conn_str = options
                .iter()
                .find(|(k, _)| *k == "dev")
                .map(|(k, v)| format!("{}={}", k, v))
                .ok_or("serial requires a port.\nUsage: serial:dev=/dev/ttyUSB0[:baud]")?;

            let opts = SerialOptions::parse(&conn_str)
                .map_err(|e| format!("Invalid serial parameters: {}", e))?;

            log::info!("Opening bridge on {}...", opts.device);
            let channel = SerialChannel::open(&opts.device, opts.baud)
                .map_err(|e| format!("Failed to open serial port {}: {}", opts.device, e))?;
            Box::new(channel)
        }

        #[cfg(feature = "dummy")]
        "dummy" => {
            log::info!("Using emulated bridge firmware");
            Box::new(zedspi_dummy::DummyBridge::new())
        }

        _ => return Err(unknown_bridge_error(name)),
    };

    log::debug!("Bridge timing: {:?}", timing);
    Ok(Bridge::with_timing(channel, timing))
}

/// Parse a link string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_bridge_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_bridge_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown bridge: {}\n\n", name);
    msg.push_str(&format!("Available: {}", bridge_names_short()));
    msg.push_str("\nUse 'zedspi list-bridges' for more details");
    msg.into()
}
