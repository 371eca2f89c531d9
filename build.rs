//! Build script that bakes an ffmpeg location into the binary.
//!
//! When `FFMPEG_DIR` is set at build time, its `bin` directory (or the
//! directory itself) is exported as `FFMPEG_BIN_PATH` for the detector.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=FFMPEG_DIR");

    if let Ok(ffmpeg_dir) = env::var("FFMPEG_DIR") {
        println!("cargo:warning=Using FFMPEG_DIR: {}", ffmpeg_dir);

        let bin_path = PathBuf::from(&ffmpeg_dir).join("bin");
        if bin_path.exists() {
            println!(
                "cargo:rustc-env=FFMPEG_BIN_PATH={}",
                bin_path.to_string_lossy()
            );
        } else {
            println!("cargo:rustc-env=FFMPEG_BIN_PATH={}", ffmpeg_dir);
        }
    }
}
