use std::io::{self, BufWriter, Write};
use std::net::Ipv4Addr;
use std::path::Path;
use std::str::FromStr;

use fake::faker::internet::raw::IPv4;
use fake::locales::EN;
use fake::Fake;

// Generate `count` IPv4 addresses from a deterministic LCG stream.
#[must_use]
pub fn generate_ipv4(count: u64) -> Vec<u32> {
    let mut ips = Vec::with_capacity(count as usize);
    let mut state = 0x4D59_5DF4_D0F3_3173_u64;
    for _ in 0..count {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        ips.push((state >> 24) as u32);
    }
    ips
}

// Generate `count` random IPv4 addresses with `fake`.
#[must_use]
pub fn generate_fake_ipv4(count: u64) -> Vec<u32> {
    let mut ips = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let val: String = IPv4(EN).fake();
        let ip: Ipv4Addr = FromStr::from_str(&val).unwrap();
        ips.push(u32::from(ip));
    }
    ips
}

// Write one dotted-decimal address per line.
pub fn write_ipv4_file(path: &Path, ips: &[u32]) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(1 << 20, std::fs::File::create(path)?);
    for &ip in ips {
        writeln!(writer, "{}", Ipv4Addr::from(ip))?;
    }
    writer.flush()
}
