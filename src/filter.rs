/// Built-in prefixes treated as JDK classes when `--exclude-jdk` is set.
const JDK_PREFIXES: &[&str] = &[
    "java.",
    "javax.",
    "sun.",
    "com.sun.",
    "jdk.",
    "com.oracle.",
    "org.w3c.",
    "org.xml.",
    "org.ietf.",
];

/// Filter settings collected from the command line.
#[derive(Clone, Debug, Default)]
pub struct FilterConfig {
    pub include_prefixes: Vec<String>,
    pub exclude_prefixes: Vec<String>,
    pub exclude_jdk: bool,
}

/// Pure predicate over fully qualified class names. Exclusions win over
/// inclusions; an empty include list admits everything not excluded.
#[derive(Clone, Debug)]
pub struct NameFilter {
    include_prefixes: Vec<String>,
    exclude_prefixes: Vec<String>,
    exclude_jdk: bool,
}

impl NameFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            include_prefixes: config.include_prefixes.clone(),
            exclude_prefixes: config.exclude_prefixes.clone(),
            exclude_jdk: config.exclude_jdk,
        }
    }

    pub fn admits(&self, fqn: &str) -> bool {
        if self.exclude_jdk && is_jdk_class(fqn) {
            return false;
        }
        if self
            .exclude_prefixes
            .iter()
            .any(|prefix| fqn.starts_with(prefix.as_str()))
        {
            return false;
        }
        if self.include_prefixes.is_empty() {
            return true;
        }

        // The package portion check keeps "include this package" working when
        // the prefix names the package exactly; the fqn check keeps "include
        // this class" working.
        let package = package_of(fqn);
        self.include_prefixes.iter().any(|prefix| {
            fqn.starts_with(prefix.as_str()) || package.starts_with(prefix.as_str())
        })
    }
}

fn is_jdk_class(fqn: &str) -> bool {
    JDK_PREFIXES.iter().any(|prefix| fqn.starts_with(prefix))
}

/// Everything before the last dot; empty for the default package.
fn package_of(fqn: &str) -> &str {
    match fqn.rfind('.') {
        Some(index) => &fqn[..index],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(include: &[&str], exclude: &[&str], exclude_jdk: bool) -> NameFilter {
        NameFilter::new(&FilterConfig {
            include_prefixes: include.iter().map(|s| s.to_string()).collect(),
            exclude_prefixes: exclude.iter().map(|s| s.to_string()).collect(),
            exclude_jdk,
        })
    }

    #[test]
    fn empty_filter_admits_everything() {
        let filter = filter(&[], &[], false);
        assert!(filter.admits("com.example.Service"));
        assert!(filter.admits("NoPackage"));
        assert!(filter.admits("java.lang.Object"));
    }

    #[test]
    fn jdk_exclusion_covers_builtin_prefixes() {
        let filter = filter(&[], &[], true);
        assert!(!filter.admits("java.lang.Object"));
        assert!(!filter.admits("javax.servlet.Foo"));
        assert!(!filter.admits("jdk.internal.misc.Unsafe"));
        assert!(filter.admits("com.example.java.Helper"));
    }

    #[test]
    fn include_prefix_matches_package_exactly() {
        let filter = filter(&["a.b"], &[], false);
        assert!(filter.admits("a.b.C"));
        assert!(filter.admits("a.b.c.D"));
        assert!(!filter.admits("a.x.C"));
    }

    #[test]
    fn include_prefix_matches_exact_class() {
        let filter = filter(&["a.b.C"], &[], false);
        assert!(filter.admits("a.b.C"));
    }

    #[test]
    fn exclusion_wins_over_inclusion() {
        let filter = filter(&["cherry.testtool"], &["cherry.testtool.test"], false);
        assert!(filter.admits("cherry.testtool.Main"));
        assert!(!filter.admits("cherry.testtool.test.Mock"));
    }

    #[test]
    fn fqn_equal_to_exclude_prefix_is_excluded() {
        let filter = filter(&[], &["a.b.C"], false);
        assert!(!filter.admits("a.b.C"));
    }

    #[test]
    fn default_package_class_checks_empty_package() {
        let f1 = filter(&["a"], &[], false);
        assert!(!f1.admits("Main"));
        let f2 = filter(&[""], &[], false);
        assert!(f2.admits("Main"));
    }
}
