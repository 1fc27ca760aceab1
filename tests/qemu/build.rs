use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Each target runs on a different QEMU machine
    let target = env::var("TARGET").unwrap();
    let memory = if target.starts_with("thumbv6m") {
        "memory/nrf51822.x"
    } else if target.ends_with("eabihf") {
        "memory/mps2-an386.x"
    } else {
        "memory/lm3s6965.x"
    };

    // Copy the memory layout into OUT_DIR as memory.x so the linker can find it
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::copy(memory, out_dir.join("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory");
    println!("cargo:rerun-if-changed=build.rs");
}
