use super::ModulePath;

/// Recognizes infra/tooling modules by folder-name suffix.
///
/// Infra modules are built implicitly (e.g. as included builds), so they are
/// never written to, nor slept in, the manifest.
#[derive(Debug, Clone, Default)]
pub struct InfraMatcher {
    suffixes: Vec<String>,
}

impl InfraMatcher {
    pub fn new(suffixes: impl IntoIterator<Item = String>) -> Self {
        Self {
            suffixes: suffixes.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn is_infra(&self, path: &ModulePath) -> bool {
        let name = path.name();
        !name.is_empty() && self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_match() {
        let infra = InfraMatcher::new(["build-logic".to_string(), "-convention".to_string()]);
        assert!(infra.is_infra(&ModulePath::parse(":build-logic").unwrap()));
        assert!(infra.is_infra(&ModulePath::parse(":gradle:kotlin-convention").unwrap()));
        assert!(!infra.is_infra(&ModulePath::parse(":lib:convention-docs").unwrap()));
        assert!(!infra.is_infra(&ModulePath::root()));
    }
}
