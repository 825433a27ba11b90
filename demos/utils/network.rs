use std::io;
use std::process::Command;

use log::info;

/// Runs one `ip` command, turning a non-zero exit into an error.
fn run_ip(args: &[&str]) -> io::Result<()> {
    let status = Command::new("ip").args(args).status()?;
    if !status.success() {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("`ip {}` failed with {}", args.join(" "), status),
        ));
    }
    Ok(())
}

/// Gives the host side of the TAP device an address and brings it up.
pub fn configure_interface(iface_name: &str, ip_cidr: &str) -> io::Result<()> {
    run_ip(&["addr", "add", ip_cidr, "dev", iface_name])?;
    run_ip(&["link", "set", "up", "dev", iface_name])?;

    info!("interface {} configured with {} and brought up", iface_name, ip_cidr);
    Ok(())
}
