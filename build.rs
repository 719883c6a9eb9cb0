use std::env;
use std::path::{Path, PathBuf};

const WATCHED_VARS: [&str; 4] = ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_DYNAMIC", "VCPKGRS_TRIPLET"];

fn main() {
    for var in WATCHED_VARS {
        println!("cargo:rerun-if-env-changed={var}");
    }

    // ffmpeg-sys-next finds FFmpeg through pkg-config everywhere but Windows.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    match vcpkg_install_dir() {
        Some(dir) if dir.exists() => suggest_ffmpeg_dir(&dir),
        Some(dir) => println!(
            "cargo:warning=framestitch: no vcpkg FFmpeg under {}; run `vcpkg install ffmpeg` or set FFMPEG_DIR.",
            dir.display()
        ),
        None => println!(
            "cargo:warning=framestitch: set FFMPEG_DIR (or VCPKG_ROOT) so ffmpeg-sys-next can find the FFmpeg libraries."
        ),
    }
}

fn vcpkg_install_dir() -> Option<PathBuf> {
    let root = env::var_os("VCPKG_ROOT")?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}

fn suggest_ffmpeg_dir(dir: &Path) {
    println!(
        "cargo:warning=framestitch: found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to pin it.",
        dir.display()
    );
    if env::var_os("VCPKGRS_DYNAMIC").is_none() {
        println!("cargo:warning=framestitch: set VCPKGRS_DYNAMIC=1 for a dynamic vcpkg FFmpeg build.");
    }
}
