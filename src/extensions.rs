//! Extension queries through the resolved GL entry points.

use std::ffi::{c_void, CStr};
use std::os::raw::c_char;
use std::ptr::NonNull;

const GL_VERSION: u32 = 0x1F02;
const GL_EXTENSIONS: u32 = 0x1F03;
const GL_NUM_EXTENSIONS: u32 = 0x821D;

type GetString = unsafe extern "system" fn(u32) -> *const u8;
type GetStringi = unsafe extern "system" fn(u32, u32) -> *const u8;
type GetIntegerv = unsafe extern "system" fn(u32, *mut i32);

/// Check whether the current context advertises `name`.
///
/// `resolve` must return entry points valid for the calling thread's current
/// context.
pub(crate) fn extension_supported<F>(mut resolve: F, name: &str) -> bool
where
    F: FnMut(&str) -> Option<NonNull<c_void>>,
{
    // Extension names never contain spaces.
    if name.is_empty() || name.contains(' ') {
        return false;
    }

    let Some(get_string) = resolve("glGetString") else {
        return false;
    };
    let get_string: GetString = unsafe { std::mem::transmute(get_string.as_ptr()) };

    let major = unsafe { gl_string(get_string(GL_VERSION)) }.as_deref().and_then(major_version);

    if major.unwrap_or(0) >= 3 {
        if let (Some(get_stringi), Some(get_integerv)) =
            (resolve("glGetStringi"), resolve("glGetIntegerv"))
        {
            let get_stringi: GetStringi = unsafe { std::mem::transmute(get_stringi.as_ptr()) };
            let get_integerv: GetIntegerv = unsafe { std::mem::transmute(get_integerv.as_ptr()) };

            let mut count = 0;
            unsafe { get_integerv(GL_NUM_EXTENSIONS, &mut count) };
            return (0..count.max(0) as u32).any(|index| {
                unsafe { gl_string(get_stringi(GL_EXTENSIONS, index)) }.as_deref() == Some(name)
            });
        }
    }

    unsafe { gl_string(get_string(GL_EXTENSIONS)) }
        .map_or(false, |extensions| extensions.split_ascii_whitespace().any(|ext| ext == name))
}

unsafe fn gl_string(raw: *const u8) -> Option<String> {
    if raw.is_null() {
        return None;
    }

    Some(unsafe { CStr::from_ptr(raw as *const c_char) }.to_string_lossy().into_owned())
}

/// Major version out of a `GL_VERSION` string, e.g. `OpenGL ES 3.2 Mesa`.
fn major_version(version: &str) -> Option<u32> {
    let version = version.trim_start_matches("OpenGL ES-CM ");
    let version = version.trim_start_matches("OpenGL ES-CL ");
    let version = version.trim_start_matches("OpenGL ES ");
    version.split(|c: char| !c.is_ascii_digit()).next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "system" fn legacy_get_string(name: u32) -> *const u8 {
        match name {
            GL_VERSION => b"2.1 Legacy\0".as_ptr(),
            GL_EXTENSIONS => b"GL_ARB_framebuffer_object GL_EXT_texture_filter_anisotropic\0".as_ptr(),
            _ => std::ptr::null(),
        }
    }

    unsafe extern "system" fn modern_get_string(name: u32) -> *const u8 {
        match name {
            GL_VERSION => b"OpenGL ES 3.2 Modern\0".as_ptr(),
            _ => std::ptr::null(),
        }
    }

    unsafe extern "system" fn modern_get_stringi(name: u32, index: u32) -> *const u8 {
        match (name, index) {
            (GL_EXTENSIONS, 0) => b"GL_OES_EGL_image\0".as_ptr(),
            (GL_EXTENSIONS, 1) => b"GL_KHR_debug\0".as_ptr(),
            _ => std::ptr::null(),
        }
    }

    unsafe extern "system" fn modern_get_integerv(name: u32, data: *mut i32) {
        if name == GL_NUM_EXTENSIONS {
            unsafe { *data = 2 };
        }
    }

    fn legacy(name: &str) -> Option<NonNull<c_void>> {
        match name {
            "glGetString" => NonNull::new(legacy_get_string as *mut c_void),
            _ => None,
        }
    }

    fn modern(name: &str) -> Option<NonNull<c_void>> {
        match name {
            "glGetString" => NonNull::new(modern_get_string as *mut c_void),
            "glGetStringi" => NonNull::new(modern_get_stringi as *mut c_void),
            "glGetIntegerv" => NonNull::new(modern_get_integerv as *mut c_void),
            _ => None,
        }
    }

    #[test]
    fn legacy_extension_string_is_matched_by_token() {
        assert!(extension_supported(legacy, "GL_ARB_framebuffer_object"));
        assert!(extension_supported(legacy, "GL_EXT_texture_filter_anisotropic"));
        assert!(!extension_supported(legacy, "GL_ARB_framebuffer"));
        assert!(!extension_supported(legacy, "GL_ARB_framebuffer_object GL_EXT"));
        assert!(!extension_supported(legacy, ""));
    }

    #[test]
    fn indexed_extensions_are_used_from_version_three() {
        assert!(extension_supported(modern, "GL_KHR_debug"));
        assert!(extension_supported(modern, "GL_OES_EGL_image"));
        assert!(!extension_supported(modern, "GL_ARB_framebuffer_object"));
    }

    #[test]
    fn nothing_is_supported_without_entry_points() {
        assert!(!extension_supported(|_| None, "GL_KHR_debug"));
    }

    #[test]
    fn version_strings() {
        assert_eq!(major_version("4.6.0 NVIDIA 535.54"), Some(4));
        assert_eq!(major_version("OpenGL ES 3.2 Mesa 23.1"), Some(3));
        assert_eq!(major_version("OpenGL ES-CM 1.1"), Some(1));
        assert_eq!(major_version("garbage"), None);
    }
}
