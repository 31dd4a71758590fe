use cfg_aliases::cfg_aliases;
use gl_generator::{Api, Fallbacks, Profile, Registry};
use std::env;
use std::fs::File;
use std::path::PathBuf;

fn main() {
    cfg_aliases! {
        // Systems.
        android_platform: { target_os = "android" },
        free_unix: { all(unix, not(target_vendor = "apple"), not(android_platform)) },

        // Native displays.
        x11_platform: { free_unix },

        // Backends.
        egl_backend: { all(feature = "egl", any(windows, free_unix, android_platform)) },
    }

    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    println!("cargo:rerun-if-changed=build.rs");

    let mut file = File::create(dest.join("egl_bindings.rs")).unwrap();
    Registry::new(
        Api::Egl,
        (1, 5),
        Profile::Core,
        Fallbacks::All,
        [
            "EGL_KHR_create_context",
            "EGL_EXT_create_context_robustness",
            "EGL_KHR_create_context_no_error",
            "EGL_KHR_gl_colorspace",
        ],
    )
    .write_bindings(gl_generator::StructGenerator, &mut file)
    .unwrap();
}
