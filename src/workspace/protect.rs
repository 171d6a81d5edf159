//! Protected modules: never released by the idle sweep.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;

use crate::module::{InfraMatcher, ModuleIndex, ModulePath};

/// Infra modules plus modules whose folder name is pinned, before closure.
pub fn protected_seed(
    index: &ModuleIndex,
    infra: &InfraMatcher,
    pinned: &[String],
) -> BTreeSet<ModulePath> {
    let pinned: FxHashSet<&str> = pinned.iter().map(String::as_str).collect();
    index
        .paths()
        .filter(|path| !path.is_root())
        .filter(|path| infra.is_infra(path) || pinned.contains(path.name()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::fixture::{module, project};

    #[test]
    fn test_infra_and_pinned_are_protected() {
        let (temp, layout) = project();
        module(temp.path(), "build-logic", "");
        module(temp.path(), "app", "");
        module(temp.path(), "lib/core", "");
        module(temp.path(), "lib/other", "");
        let index = ModuleIndex::scan(&layout);
        let infra = InfraMatcher::new(["build-logic".to_string()]);

        let seed = protected_seed(&index, &infra, &["core".to_string()]);
        let names: Vec<_> = seed.iter().map(ModulePath::as_str).collect();
        assert_eq!(names, vec![":build-logic", ":lib:core"]);
    }
}
