//! Namespace resolution for lazily loaded parts of the SDK.
//!
//! Each namespace has a dotted path (`seekgpt.resources`, ...) registered in a
//! module table together with the optional libraries it needs. Importing a path
//! checks those requirements against a [`Probe`] and reports a missing extra as a
//! [`MissingDependencyError`] rather than a bare lookup failure.

use std::fmt;
use std::marker::PhantomData;

use crate::error::LoadError;
use crate::extras::MissingDependencyError;
use crate::proxy::Loader;

/// An optional library a module needs, and the extra that provides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirement {
    pub library: &'static str,
    pub extra: &'static str,
    /// Whether the library was compiled into this build.
    pub linked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleSpec {
    pub path: &'static str,
    pub requires: &'static [Requirement],
}

pub const RESOURCES_PATH: &str = "seekgpt.resources";
pub const STREAMING_PATH: &str = "seekgpt.streaming";
pub const CODECS_PATH: &str = "seekgpt.codecs";

pub const BUILTIN_MODULES: &[ModuleSpec] = &[
    ModuleSpec {
        path: RESOURCES_PATH,
        requires: &[],
    },
    ModuleSpec {
        path: STREAMING_PATH,
        requires: &[Requirement {
            library: "futures-util",
            extra: "streaming",
            linked: cfg!(feature = "streaming"),
        }],
    },
    ModuleSpec {
        path: CODECS_PATH,
        requires: &[
            Requirement {
                library: "image",
                extra: "codecs",
                linked: cfg!(feature = "codecs"),
            },
            Requirement {
                library: "base64",
                extra: "codecs",
                linked: cfg!(feature = "codecs"),
            },
        ],
    },
];

/// Decides whether a requirement can be satisfied at runtime.
pub trait Probe: fmt::Debug + Sync {
    fn is_available(&self, requirement: &Requirement) -> bool;
}

/// Trusts the compile-time feature state recorded in the module table.
#[derive(Debug, Default, Clone, Copy)]
pub struct Linked;

impl Probe for Linked {
    fn is_available(&self, requirement: &Requirement) -> bool {
        requirement.linked
    }
}

const LINKED: &Linked = &Linked;

/// Module table plus the probe used to check its requirements.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    modules: &'static [ModuleSpec],
    probe: &'static dyn Probe,
}

impl Registry {
    pub const fn new(modules: &'static [ModuleSpec], probe: &'static dyn Probe) -> Self {
        Self { modules, probe }
    }

    /// The crate's own module table, checked against compiled features.
    pub const fn builtin() -> Self {
        Self::new(BUILTIN_MODULES, LINKED)
    }

    pub fn modules(&self) -> &'static [ModuleSpec] {
        self.modules
    }

    /// Looks up `path` and verifies every library it depends on.
    pub fn import(&self, path: &str) -> Result<&'static ModuleSpec, LoadError> {
        let module = self
            .modules
            .iter()
            .find(|module| module.path == path)
            .ok_or_else(|| LoadError::ModuleNotFound(path.to_string()))?;

        if let Some(missing) = module
            .requires
            .iter()
            .find(|requirement| !self.probe.is_available(requirement))
        {
            return Err(MissingDependencyError::new(missing.library, missing.extra).into());
        }

        Ok(module)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A lazily materialized part of the SDK, addressed by its module path.
pub trait Namespace: Sized {
    const PATH: &'static str;

    /// Whatever the namespace needs to be built (a transport, or nothing).
    type Deps;

    fn materialize(deps: &Self::Deps) -> Self;
}

/// Imports `N::PATH` through a [`Registry`] and builds the namespace.
pub struct ModuleLoader<N: Namespace> {
    registry: Registry,
    deps: N::Deps,
    _namespace: PhantomData<fn() -> N>,
}

impl<N: Namespace> ModuleLoader<N> {
    pub const fn new(registry: Registry, deps: N::Deps) -> Self {
        Self {
            registry,
            deps,
            _namespace: PhantomData,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl<N: Namespace> Loader for ModuleLoader<N> {
    type Output = N;
    type Error = LoadError;

    fn load(&self) -> Result<N, LoadError> {
        self.registry.import(N::PATH)?;
        Ok(N::materialize(&self.deps))
    }
}

impl<N: Namespace> fmt::Debug for ModuleLoader<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("path", &N::PATH)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BUILTIN_MODULES, CODECS_PATH, Linked, ModuleLoader, ModuleSpec, Namespace, Probe,
        RESOURCES_PATH, Registry, Requirement, STREAMING_PATH,
    };
    use crate::error::LoadError;
    use crate::extras::MissingDependencyError;
    use crate::proxy::{LazyProxy, Loader};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Nothing;

    impl Probe for Nothing {
        fn is_available(&self, _requirement: &Requirement) -> bool {
            false
        }
    }

    static NOTHING: Nothing = Nothing;

    const TURBO_MODULES: &[ModuleSpec] = &[ModuleSpec {
        path: "seekgpt.resources",
        requires: &[Requirement {
            library: "turbo",
            extra: "turbo",
            linked: true,
        }],
    }];

    #[derive(Debug)]
    struct Marker(u8);

    impl Namespace for Marker {
        const PATH: &'static str = "seekgpt.resources";
        type Deps = u8;

        fn materialize(deps: &u8) -> Self {
            Marker(*deps)
        }
    }

    #[test]
    fn resources_are_always_importable() {
        let module = Registry::builtin().import(RESOURCES_PATH).unwrap();

        assert_eq!(module.path, RESOURCES_PATH);
        assert!(module.requires.is_empty());
    }

    #[test]
    fn unknown_paths_are_not_found() {
        let err = Registry::builtin().import("seekgpt.nope").unwrap_err();

        assert_eq!(err, LoadError::ModuleNotFound("seekgpt.nope".to_string()));
    }

    #[test]
    fn builtin_extras_follow_compiled_features() {
        let registry = Registry::builtin();

        assert_eq!(
            registry.import(STREAMING_PATH).is_ok(),
            cfg!(feature = "streaming")
        );
        assert_eq!(registry.import(CODECS_PATH).is_ok(), cfg!(feature = "codecs"));
        assert_eq!(BUILTIN_MODULES.len(), 3);
    }

    #[test]
    fn first_unavailable_requirement_is_reported() {
        let registry = Registry::new(BUILTIN_MODULES, &NOTHING);

        let err = registry.import(CODECS_PATH).unwrap_err();

        assert_eq!(
            err,
            LoadError::MissingDependency(MissingDependencyError::new("image", "codecs"))
        );
    }

    #[test]
    fn missing_backing_library_surfaces_through_the_loader() {
        let registry = Registry::new(TURBO_MODULES, &NOTHING);
        let proxy = LazyProxy::new(ModuleLoader::<Marker>::new(registry, 3));

        let err = proxy.resolve().unwrap_err();

        let missing = match err {
            LoadError::MissingDependency(missing) => missing,
            other => panic!("expected a missing dependency, got {other:?}"),
        };
        assert_eq!(missing.library, "turbo");
        assert_eq!(missing.extra, "turbo");
        assert!(missing.to_string().contains("missing `turbo`"));
        assert!(!proxy.is_loaded());
    }

    #[test]
    fn satisfied_requirements_materialize_the_namespace() {
        let loader = ModuleLoader::<Marker>::new(Registry::new(TURBO_MODULES, &Linked), 9);

        let marker = loader.load().unwrap();

        assert_eq!(marker.0, 9);
    }

    #[test]
    fn loading_emits_no_log_events() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let missing = LazyProxy::new(ModuleLoader::<Marker>::new(
                Registry::new(TURBO_MODULES, &NOTHING),
                1,
            ));
            assert!(missing.resolve().is_err());

            let present = LazyProxy::new(ModuleLoader::<Marker>::new(
                Registry::new(TURBO_MODULES, &Linked),
                2,
            ));
            assert_eq!(present.resolve().unwrap().0, 2);
            assert!(crate::extras::format_instructions("turbo", "turbo").contains("turbo"));
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.is_empty(), "unexpected log output: {logs}");
    }
}
