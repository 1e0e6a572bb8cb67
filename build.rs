fn main() {
    // Keep `check-cfg` happy even when we skip `tauri_build::build()` (core-only builds).
    println!("cargo:rustc-check-cfg=cfg(desktop)");
    println!("cargo:rustc-check-cfg=cfg(mobile)");

    // `tauri_build::build()` reads env vars exported by the `tauri` crate, which is
    // only compiled with the `app` feature. Plain `cargo test` builds the core alone.
    if std::env::var_os("CARGO_FEATURE_APP").is_some() {
        tauri_build::build()
    }
}
