use std::fs;
use std::path::Path;

fn copy_frontend(dist_dir: &Path, out_dir: &Path) -> Result<(), String> {
    let _ = fs::remove_dir_all(out_dir.join("dist"));
    fs::create_dir_all(out_dir).map_err(|e| e.to_string())?;
    fs_extra::dir::copy(
        dist_dir,
        out_dir,
        &fs_extra::dir::CopyOptions::new().overwrite(true),
    )
    .map(|_| ())
    .map_err(|e| e.to_string())
}

fn main() {
    let out_dir = Path::new("static");
    let dist_dir = Path::new("../frontend/dist");

    if dist_dir.exists() {
        if let Err(e) = copy_frontend(dist_dir, out_dir) {
            println!("cargo:warning=could not copy frontend build: {}", e);
        }
    }
    println!("cargo:rerun-if-changed=../frontend/dist");
}
