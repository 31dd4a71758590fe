//! Library loading and entry point resolution.

use std::collections::HashMap;
use std::ffi::{c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use libloading::Library;
use once_cell::sync::Lazy;

#[cfg(windows)]
use libloading::os::windows::{Library as WinLibrary, LOAD_LIBRARY_SEARCH_DEFAULT_DIRS};

use crate::error::{Error, ErrorKind, Result};

/// Symbols linked into the process itself.
static PROCESS_SYMBOLS: Lazy<Option<Library>> = Lazy::new(|| {
    #[cfg(unix)]
    let this = Some(libloading::os::unix::Library::this().into());

    #[cfg(windows)]
    let this = libloading::os::windows::Library::this().ok().map(From::from);

    #[cfg(not(any(unix, windows)))]
    let this = None;

    this
});

/// What [`SymbolResolver::load`] did.
#[derive(Debug)]
pub(crate) enum LoadOutcome {
    /// The library was loaded now, `None` when the platform's implicit
    /// library is used.
    Loaded(Option<Arc<Library>>),

    /// A library was loaded already, its reference count was increased.
    AlreadyLoaded,
}

#[derive(Debug)]
struct LoadedLibrary {
    library: Option<Arc<Library>>,
    path: Option<PathBuf>,
    refcount: usize,
}

/// The loaded GL library and the cache of the entry points resolved from it.
#[derive(Debug, Default)]
pub(crate) struct SymbolResolver {
    loaded: Option<LoadedLibrary>,
    table: HashMap<String, usize>,
}

impl SymbolResolver {
    /// Load the library at `path`, or the first loadable of `defaults`.
    ///
    /// Empty `defaults` means the platform links GL into the process and
    /// nothing has to be opened.
    pub(crate) fn load(&mut self, path: Option<&Path>, defaults: &[&str]) -> Result<LoadOutcome> {
        if let Some(loaded) = self.loaded.as_mut() {
            return match path {
                Some(path) if loaded.path.as_deref() != Some(path) => Err(Error::new(
                    None,
                    Some(format!("a GL library is already loaded, can't load {}", path.display())),
                    ErrorKind::LoadLibrary,
                )),
                _ => {
                    loaded.refcount += 1;
                    Ok(LoadOutcome::AlreadyLoaded)
                },
            };
        }

        let (library, path) = match path {
            Some(path) => (Some(open(path)?), Some(path.to_owned())),
            None if defaults.is_empty() => (None, None),
            None => {
                let mut last_error = None;
                let mut found = None;
                for candidate in defaults {
                    match open(Path::new(candidate)) {
                        Ok(library) => {
                            found = Some((library, PathBuf::from(candidate)));
                            break;
                        },
                        Err(err) => last_error = Some(err),
                    }
                }

                match found {
                    Some((library, path)) => (Some(library), Some(path)),
                    None => {
                        return Err(last_error.unwrap_or_else(|| ErrorKind::LoadLibrary.into()))
                    },
                }
            },
        };

        let library = library.map(Arc::new);
        self.loaded = Some(LoadedLibrary { library: library.clone(), path, refcount: 1 });
        Ok(LoadOutcome::Loaded(library))
    }

    /// Drop one reference, returns `true` when the library was released.
    pub(crate) fn unload(&mut self) -> bool {
        let Some(loaded) = self.loaded.as_mut() else {
            return false;
        };

        loaded.refcount -= 1;
        if loaded.refcount > 0 {
            return false;
        }

        // The cached addresses point into the library.
        self.table.clear();
        self.loaded = None;
        true
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// The path the library was loaded from, `None` for implicit libraries.
    pub(crate) fn path(&self) -> Option<&Path> {
        self.loaded.as_ref().and_then(|loaded| loaded.path.as_deref())
    }

    /// Resolve `name`.
    ///
    /// The loaded library is searched first, then `loader`, the api specific
    /// lookup like `eglGetProcAddress`, and finally the symbols linked into
    /// the process when `static_fallback` is set. Only found addresses are
    /// cached, some loaders only return extensions once a context exists.
    pub(crate) fn resolve<F>(
        &mut self,
        name: &str,
        loader: F,
        static_fallback: bool,
    ) -> Option<NonNull<c_void>>
    where
        F: FnOnce(&CStr) -> Option<NonNull<c_void>>,
    {
        let loaded = self.loaded.as_ref()?;

        if let Some(address) = self.table.get(name) {
            return NonNull::new(*address as *mut c_void);
        }

        let symbol = CString::new(name).ok()?;
        let address = loaded
            .library
            .as_deref()
            .and_then(|library| lookup(library, &symbol))
            .or_else(|| loader(&symbol))
            .or_else(|| {
                static_fallback
                    .then(|| PROCESS_SYMBOLS.as_ref().and_then(|this| lookup(this, &symbol)))
                    .flatten()
            })?;

        log::trace!("resolved {name} at {address:p}");
        self.table.insert(name.to_owned(), address.as_ptr() as usize);
        Some(address)
    }
}

fn open(path: &Path) -> Result<Library> {
    #[cfg(windows)]
    let library =
        unsafe { WinLibrary::load_with_flags(path, LOAD_LIBRARY_SEARCH_DEFAULT_DIRS).map(From::from) };

    #[cfg(not(windows))]
    let library = unsafe { Library::new(path) };

    library.map_err(|err| Error::new(None, Some(err.to_string()), ErrorKind::LoadLibrary))
}

fn lookup(library: &Library, symbol: &CStr) -> Option<NonNull<c_void>> {
    unsafe {
        library
            .get::<*mut c_void>(symbol.to_bytes_with_nul())
            .ok()
            .and_then(|symbol| NonNull::new(*symbol))
    }
}
