//! Packed hexadecimal endpoint decoding for /proc/net socket tables.
//!
//! The kernel prints each endpoint as `<hexaddr>:<hexport>`. The address
//! half is the raw in-memory value on little-endian hardware, which inverts
//! the usual network byte order: `0100007F` is 127.0.0.1, not 1.0.0.127.
//! IPv6 addresses are printed as four 32-bit groups, each group
//! little-endian, groups kept in left-to-right order. Both quirks must be
//! reproduced exactly.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

/// Decode a packed `hexaddr:hexport` endpoint into an address and port.
///
/// The address family is inferred from the address length: 8 hex digits is
/// IPv4, 32 is IPv6. Any other length, or a non-hex address or port, is a
/// [`Error::MalformedAddress`] naming the offending string.
pub fn decode_addr(s: &str) -> Result<(IpAddr, u16)> {
    let Some((addr_hex, port_hex)) = s.split_once(':') else {
        return Err(Error::MalformedAddress(s.to_string()));
    };

    let ip = match addr_hex.len() {
        8 => IpAddr::V4(decode_ipv4(addr_hex)?),
        32 => IpAddr::V6(decode_ipv6(addr_hex)?),
        _ => return Err(Error::MalformedAddress(s.to_string())),
    };

    let port = u16::from_str_radix(port_hex, 16)
        .map_err(|_| Error::MalformedAddress(s.to_string()))?;

    Ok((ip, port))
}

/// Encode an endpoint back into the kernel's packed form.
///
/// Exact inverse of [`decode_addr`]; used to synthesize table fixtures.
pub fn encode_addr(ip: IpAddr, port: u16) -> String {
    match ip {
        IpAddr::V4(v4) => {
            format!("{:08X}:{:04X}", u32::from_le_bytes(v4.octets()), port)
        }
        IpAddr::V6(v6) => {
            let octets = v6.octets();
            let mut hex = String::with_capacity(32);
            for group in octets.chunks_exact(4) {
                let v = u32::from_le_bytes([group[0], group[1], group[2], group[3]]);
                hex.push_str(&format!("{v:08X}"));
            }
            format!("{hex}:{port:04X}")
        }
    }
}

/// Decode 8 hex digits as an IPv4 address (little-endian reinterpretation).
fn decode_ipv4(hex: &str) -> Result<Ipv4Addr> {
    let v = u32::from_str_radix(hex, 16).map_err(|_| Error::MalformedAddress(hex.to_string()))?;
    Ok(Ipv4Addr::from(v.to_le_bytes()))
}

/// Decode 32 hex digits as an IPv6 address: four 8-digit groups, each a
/// little-endian u32, written into the 16 bytes in group order.
fn decode_ipv6(hex: &str) -> Result<Ipv6Addr> {
    // Length was checked in bytes; reject multi-byte characters before
    // slicing on fixed offsets.
    if !hex.is_ascii() {
        return Err(Error::MalformedAddress(hex.to_string()));
    }

    let mut octets = [0u8; 16];
    for i in 0..4 {
        let group = &hex[i * 8..(i + 1) * 8];
        let v =
            u32::from_str_radix(group, 16).map_err(|_| Error::MalformedAddress(hex.to_string()))?;
        octets[i * 4..(i + 1) * 4].copy_from_slice(&v.to_le_bytes());
    }
    Ok(Ipv6Addr::from(octets))
}
