use std::env;
use std::path::PathBuf;

// These helper functions are only used when the uca-sdk feature is enabled
#[allow(dead_code)]
/// Print a boxed error message for visibility in cargo output
fn print_env_error(title: &str, details: &[&str], fixes: &[&str]) {
    eprintln!();
    eprintln!("╔══════════════════════════════════════════════════════════════════╗");
    eprintln!("║ LIBUCA BUILD ERROR: {:<45} ║", title);
    eprintln!("╠══════════════════════════════════════════════════════════════════╣");
    for detail in details {
        eprintln!("║ {:<66} ║", detail);
    }
    eprintln!("╠══════════════════════════════════════════════════════════════════╣");
    eprintln!("║ HOW TO FIX:                                                      ║");
    for fix in fixes {
        eprintln!("║   {:<64} ║", fix);
    }
    eprintln!("╚══════════════════════════════════════════════════════════════════╝");
    eprintln!();
}

#[allow(dead_code)]
/// Check for common libuca library paths
fn find_uca_lib() -> Option<PathBuf> {
    let candidates = [
        "/usr/local/lib",
        "/usr/local/lib64",
        "/usr/local/lib/x86_64-linux-gnu",
        "/usr/lib/x86_64-linux-gnu",
        "/usr/lib64",
        "/usr/lib",
    ];

    for path in &candidates {
        let p = PathBuf::from(path);
        if p.join("libuca.so").exists() {
            return Some(p);
        }
    }
    None
}

#[allow(dead_code)]
/// Print diagnostic information about the environment
fn print_env_diagnostics() {
    eprintln!();
    eprintln!("=== libuca Build Diagnostics ===");
    eprintln!("UCA_LIB_DIR: {:?}", env::var("UCA_LIB_DIR").ok());
    eprintln!("LIBRARY_PATH: {:?}", env::var("LIBRARY_PATH").ok());
    eprintln!("LD_LIBRARY_PATH: {:?}", env::var("LD_LIBRARY_PATH").ok());
    eprintln!("UCA_CAMERA_PATH: {:?}", env::var("UCA_CAMERA_PATH").ok());
    eprintln!("================================");
    eprintln!();
}

fn main() {
    // Only emit link directives when the `uca-sdk` feature is enabled, so the
    // declarations compile on machines without libuca.
    #[cfg(feature = "uca-sdk")]
    {
        println!("cargo:rerun-if-env-changed=UCA_LIB_DIR");
        println!("cargo:rerun-if-env-changed=LIBRARY_PATH");

        let lib_dir = match env::var("UCA_LIB_DIR") {
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => find_uca_lib(),
        };

        match lib_dir {
            Some(dir) if dir.exists() => {
                println!("cargo:rustc-link-search=native={}", dir.display());
            }
            Some(dir) => {
                print_env_diagnostics();
                print_env_error(
                    "UCA_LIB_DIR does not exist",
                    &[&format!("Configured path: {}", dir.display())],
                    &[
                        "Verify libuca is installed: ls /usr/local/lib/libuca.so",
                        "Set correct path: export UCA_LIB_DIR=/path/to/lib",
                    ],
                );
                println!(
                    "cargo:warning=UCA_LIB_DIR does not exist: {}",
                    dir.display()
                );
            }
            None => {
                print_env_diagnostics();
                println!("cargo:warning=libuca.so not found in standard locations");
                println!("cargo:warning=Linker will search LIBRARY_PATH and system paths");
            }
        }

        println!("cargo:rustc-link-lib=uca");
        println!("cargo:rustc-link-lib=gio-2.0");
        println!("cargo:rustc-link-lib=gobject-2.0");
        println!("cargo:rustc-link-lib=glib-2.0");
    }
}
