//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kartoteka_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("kartoteka_core ping={}", kartoteka_core::ping());
    println!("kartoteka_core version={}", kartoteka_core::core_version());
}
