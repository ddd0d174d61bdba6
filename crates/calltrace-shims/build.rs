use std::env;
use std::fs;
use std::path::PathBuf;

use calltrace_gen::{Generator, RustEmitter};

/// APIs compiled into this crate. `d3d11` is left out: `d3d11_1` exports the same symbols.
const APIS: [&str; 3] = ["d3d9", "d3d11_1", "egl"];

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    for crate_name in ["calltrace-specs", "calltrace-gen"] {
        println!(
            "cargo:rerun-if-changed={}",
            manifest_dir.join("..").join(crate_name).join("src").display()
        );
    }

    for name in APIS {
        let binding = calltrace_specs::load(name)
            .unwrap_or_else(|err| panic!("failed to load the {name} tables: {err}"));
        let generated = Generator::new(&binding.api, &binding.hooks)
            .generate()
            .unwrap_or_else(|err| panic!("failed to plan the {name} shims: {err}"));
        let source = RustEmitter::new(&generated).emit_items();
        let path = out_dir.join(format!("{name}.rs"));
        fs::write(&path, source)
            .unwrap_or_else(|err| panic!("failed to write {}: {err}", path.display()));
    }
}
