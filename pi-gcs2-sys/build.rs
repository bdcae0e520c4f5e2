use std::env;
use std::path::PathBuf;

// Only used when the pi-gcs2-sdk feature is enabled
#[allow(dead_code)]
/// Check for common PI GCS2 installation paths
fn find_gcs2_lib() -> Option<PathBuf> {
    let candidates = [
        "C:\\ProgramData\\PI\\GCSTranslator",
        "/usr/local/PI/lib64",
        "/usr/local/lib",
        "/usr/lib/x86_64-linux-gnu",
    ];

    for path in &candidates {
        let p = PathBuf::from(path);
        if p.join("PI_GCS2_DLL_x64.lib").exists() || p.join("libpi_pi_gcs2.so").exists() {
            return Some(p);
        }
    }
    None
}

fn main() {
    #[cfg(feature = "pi-gcs2-sdk")]
    {
        println!("cargo:rerun-if-env-changed=PI_GCS2_LIB_DIR");

        let lib_dir = match env::var("PI_GCS2_LIB_DIR") {
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => {
                let found = find_gcs2_lib();
                if let Some(dir) = &found {
                    println!(
                        "cargo:warning=PI_GCS2_LIB_DIR not set, auto-detected: {}",
                        dir.display()
                    );
                } else {
                    println!("cargo:warning=PI_GCS2_LIB_DIR not set and PI GCS2 library not found");
                    println!("cargo:warning=Linker will search LIBRARY_PATH and standard paths");
                }
                found
            }
        };

        if let Some(dir) = lib_dir {
            println!("cargo:rustc-link-search=native={}", dir.display());
        }

        #[cfg(target_os = "windows")]
        {
            println!("cargo:rustc-link-lib=PI_GCS2_DLL_x64");
        }
        #[cfg(not(target_os = "windows"))]
        {
            println!("cargo:rustc-link-lib=pi_pi_gcs2");
        }
    }
    #[cfg(not(feature = "pi-gcs2-sdk"))]
    {
        let _ = env::var("PI_GCS2_LIB_DIR");
    }
}
