use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("config.rs");

    let logq_sz: usize = option_env!("LOGQ_SZ")
        .map(|p| p.parse::<usize>().unwrap())
        .unwrap_or(10);

    let refresh_hz: u8 = option_env!("DEFAULT_REFRESH_HZ")
        .map(|p| p.parse::<u8>().unwrap())
        .unwrap_or(5);

    let fd = fs::File::create(&dest_path).unwrap();
    writeln!(
        &fd,
        "/// Capacity of the fused-record queue to the logging consumer."
    )
    .unwrap();
    writeln!(&fd, "pub const LOGQ_SZ: usize = {logq_sz};").unwrap();
    writeln!(&fd, "/// Receiver update rate requested at start-up.").unwrap();
    writeln!(&fd, "pub const DEFAULT_REFRESH_HZ: u8 = {refresh_hz};").unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}
