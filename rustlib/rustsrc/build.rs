use std::{env, path::PathBuf};

fn main() {
    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let crate_name = env::var("CARGO_PKG_NAME").unwrap();
    let write_dest = PathBuf::from(&crate_dir)
        .join("..")
        .join("..")
        .join("target")
        .join("include")
        .join(format!("{}.h", crate_name));

    let mut conf = cbindgen::Config::default();
    conf.language = cbindgen::Language::C;
    conf.include_guard = Some(format!("{}_H", crate_name.to_uppercase()));
    conf.sys_includes = vec!["stddef.h".to_string(), "stdint.h".to_string()];
    conf.no_includes = true;

    cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_config(conf)
        .generate()
        .expect("Unable to generate bindings")
        .write_to_file(write_dest);

    println!("cargo:rerun-if-changed=src");
}
