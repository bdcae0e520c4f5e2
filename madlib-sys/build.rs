use std::env;
use std::path::PathBuf;

// Only used when the madlib-sdk feature is enabled
#[allow(dead_code)]
/// Check for common Madlib installation paths
fn find_madlib_lib() -> Option<PathBuf> {
    let candidates = [
        "C:\\Program Files\\Mad City Labs\\NanoDrive",
        "/usr/local/lib",
        "/usr/lib/x86_64-linux-gnu",
        "/opt/madcitylabs/lib",
    ];

    for path in &candidates {
        let p = PathBuf::from(path);
        if p.join("Madlib.lib").exists() || p.join("libmadlib.so").exists() {
            return Some(p);
        }
    }
    None
}

fn main() {
    // Linking only happens with the `madlib-sdk` feature so the workspace
    // builds on machines without the vendor library.
    #[cfg(feature = "madlib-sdk")]
    {
        println!("cargo:rerun-if-env-changed=MADLIB_LIB_DIR");

        let lib_dir = match env::var("MADLIB_LIB_DIR") {
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => {
                let found = find_madlib_lib();
                if let Some(dir) = &found {
                    println!(
                        "cargo:warning=MADLIB_LIB_DIR not set, auto-detected: {}",
                        dir.display()
                    );
                } else {
                    println!("cargo:warning=MADLIB_LIB_DIR not set and Madlib not found");
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
            println!("cargo:rustc-link-lib=Madlib");
        }
        #[cfg(not(target_os = "windows"))]
        {
            println!("cargo:rustc-link-lib=madlib");
        }
    }
    #[cfg(not(feature = "madlib-sdk"))]
    {
        let _ = env::var("MADLIB_LIB_DIR");
    }
}
