use std::env;
use std::path::PathBuf;

const HEADER: &str = "amrlink.h";

fn main() {
    let crate_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR unset"));
    for input in ["cbindgen.toml", "src/types.rs", "src/status.rs", "src/registry.rs"] {
        println!("cargo:rerun-if-changed={input}");
    }

    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml"))
        .expect("failed to read cbindgen.toml");
    let include = crate_dir.join("include");
    std::fs::create_dir_all(&include).expect("failed to create include/ directory");

    let bindings = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
        .expect("cbindgen failed to generate amrlink bindings");
    bindings.write_to_file(include.join(HEADER));
}
