// build.rs
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let target = env::var("TARGET").unwrap();

    println!("cargo:rerun-if-changed=build.rs");

    // Only the bare-metal Cortex-M example needs a linker memory map.
    if target.starts_with("thumbv7m") {
        let source_path = "memory_cortex_m_source.x";
        println!("cargo:rerun-if-changed={source_path}");
        let content = include_bytes!("memory_cortex_m_source.x");
        fs::write(out_dir.join("memory.x"), content).unwrap();
    }

    println!("cargo:rustc-link-search={}", out_dir.display());
}
