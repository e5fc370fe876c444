//! # logshape-ports
//!
//! Port traits for the logshape hexagonal architecture.
//!
//! This crate defines the interfaces between the record engine and the
//! emission side. It depends only on `domain` and `shared`.

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod emitter;

pub use emitter::*;

// Re-export domain types used in port signatures, so adapter crates can
// implement ports without directly depending on `logshape-domain`.
pub use logshape_domain::{DynamicField, FieldEncodeError, FieldMap, FieldValue, Severity};

#[cfg(test)]
mod tests {
    use super::*;
    use logshape_domain::domain_crate_version;
    use logshape_shared::shared_crate_version;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU8, Ordering};

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("logshape-") {
                let key = line.split('=').next().unwrap_or("").trim();
                let name = key.split('.').next().unwrap_or("").trim();
                deps.push(name.to_string());
            }
        }

        deps
    }

    #[test]
    fn ports_depends_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["logshape-domain", "logshape-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }
        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_crate_compiles() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }

    struct LevelOnly(AtomicU8);

    impl EmitterPort for LevelOnly {
        fn emit(&self, _severity: Severity, _record: Record) {}

        fn min_level(&self) -> Severity {
            Severity::ALL
                .get(usize::from(self.0.load(Ordering::Relaxed)))
                .copied()
                .unwrap_or(Severity::Info)
        }

        fn set_min_level(&self, severity: Severity) {
            let index = Severity::ALL.iter().position(|level| *level == severity);
            self.0
                .store(index.and_then(|i| u8::try_from(i).ok()).unwrap_or(2), Ordering::Relaxed);
        }

        fn child(&self) -> Arc<dyn EmitterPort> {
            Arc::new(Self(AtomicU8::new(self.0.load(Ordering::Relaxed))))
        }
    }

    #[test]
    fn is_enabled_follows_the_minimum_level() {
        let emitter = LevelOnly(AtomicU8::new(2));
        assert!(!emitter.is_enabled(Severity::Debug));
        assert!(emitter.is_enabled(Severity::Info));
        assert!(emitter.is_enabled(Severity::Fatal));

        emitter.set_min_level(Severity::Error);
        assert!(!emitter.is_enabled(Severity::Warn));
    }
}
