//! UDP echo server on a TAP device.
//!
//! Run as root (or with CAP_NET_ADMIN), then from the host:
//!
//! ```text
//! ping 10.0.0.1
//! nc -u 10.0.0.1 7
//! ```

mod utils;

use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use toy_ipv4::{Interface, StackConfig, TapDriver};
use utils::{configure_interface, init_logger};

const TAP_NAME: &str = "tap0";
const HOST_CIDR: &str = "10.0.0.254/24";
const ECHO_PORT: u16 = 7;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();

    let driver = TapDriver::open(TAP_NAME)?;
    configure_interface(driver.name(), HOST_CIDR)?;

    let config = StackConfig::default().with_arp_timeout(Duration::from_secs(60));
    let mut iface = Interface::new(config, driver)?;

    iface.udp_open(
        ECHO_PORT,
        |iface: &mut Interface, data: &[u8], src_ip: Ipv4Addr, src_port: u16| {
            info!("echo: {} bytes from {}:{}", data.len(), src_ip, src_port);
            if let Err(e) = iface.udp_send(data, ECHO_PORT, src_ip, src_port) {
                warn!("echo: reply to {}:{} failed: {}", src_ip, src_port, e);
            }
        },
    )?;
    info!("echoing UDP on {}:{}", iface.ip(), ECHO_PORT);

    loop {
        if !iface.poll()? {
            thread::sleep(Duration::from_millis(1));
        }
    }
}
