//! Component file filter.
//!
//! Discovery walks the source directories and asks [`SourceMatcher`] whether
//! a path is a component worth refactoring. Both pattern lists are globs
//! relative to the project root; exclusion wins over inclusion.

use std::fmt;
use std::path::{
    Path,
    PathBuf,
};

use globset::{
    Glob,
    GlobSet,
    GlobSetBuilder,
};

use super::Settings;

/// Which settings list a bad pattern came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternList {
    Include,
    Exclude,
}

impl fmt::Display for PatternList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Include => "includePatterns",
            Self::Exclude => "excludePatterns",
        })
    }
}

/// A glob in the settings failed to compile.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("Invalid glob in {list}: '{pattern}': {source}")]
    InvalidPattern {
        list: PatternList,
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Decides which files under the project are component sources.
#[derive(Debug, Clone)]
pub struct SourceMatcher {
    project_root: PathBuf,
    /// `includePatterns`
    components: GlobSet,
    /// `excludePatterns` (tests, type declarations, vendored code)
    ignored: GlobSet,
}

impl SourceMatcher {
    /// # Errors
    /// Returns `MatcherError::InvalidPattern` naming the first bad glob.
    pub fn new(project_root: PathBuf, settings: &Settings) -> Result<Self, MatcherError> {
        Ok(Self {
            project_root,
            components: compile(&settings.include_patterns, PatternList::Include)?,
            ignored: compile(&settings.exclude_patterns, PatternList::Exclude)?,
        })
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Whether `path` (absolute) is a component source. Paths outside the
    /// project root never are.
    #[must_use]
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.strip_prefix(&self.project_root)
            .is_ok_and(|relative| self.components.is_match(relative) && !self.ignored.is_match(relative))
    }
}

/// パターン一覧を 1 つの `GlobSet` にまとめる
fn compile(patterns: &[String], list: PatternList) -> Result<GlobSet, MatcherError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| MatcherError::InvalidPattern {
            list,
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| MatcherError::InvalidPattern {
        list,
        pattern: patterns.join(", "),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[fixture]
    fn matcher() -> SourceMatcher {
        SourceMatcher::new(PathBuf::from("/shop"), &Settings::default()).unwrap()
    }

    #[rstest]
    #[case::page("/shop/app/[locale]/page.tsx", true)]
    #[case::component("/shop/components/cart/CartButton.jsx", true)]
    #[case::hook("/shop/src/hooks/useCart.ts", true)]
    #[case::type_declarations("/shop/src/types/next-env.d.ts", false)]
    #[case::unit_test("/shop/components/cart/CartButton.test.tsx", false)]
    #[case::playwright_spec("/shop/app/checkout.spec.ts", false)]
    #[case::vendored("/shop/app/node_modules/ui/Button.jsx", false)]
    #[case::dictionary("/shop/messages/en.json", false)]
    #[case::stylesheet("/shop/app/globals.css", false)]
    #[case::outside_project("/other/app/page.tsx", false)]
    fn default_patterns_select_components(
        matcher: SourceMatcher,
        #[case] path: &str,
        #[case] expected: bool,
    ) {
        assert_that!(matcher.is_source_file(Path::new(path)), eq(expected));
    }

    #[rstest]
    fn exclusion_wins_over_inclusion() {
        let settings = Settings {
            include_patterns: vec!["app/**/*.tsx".to_string()],
            exclude_patterns: vec!["app/legacy/**".to_string()],
            ..Settings::default()
        };
        let matcher = SourceMatcher::new(PathBuf::from("/shop"), &settings).unwrap();

        assert_that!(matcher.is_source_file(Path::new("/shop/app/page.tsx")), eq(true));
        assert_that!(matcher.is_source_file(Path::new("/shop/app/legacy/Old.tsx")), eq(false));
        assert_that!(matcher.is_source_file(Path::new("/shop/components/Nav.tsx")), eq(false));
    }

    #[rstest]
    #[case::include(vec!["app/[a-".to_string()], Vec::new(), PatternList::Include)]
    #[case::exclude(vec!["**/*.tsx".to_string()], vec!["{unclosed".to_string()], PatternList::Exclude)]
    fn bad_glob_names_its_list(
        #[case] include_patterns: Vec<String>,
        #[case] exclude_patterns: Vec<String>,
        #[case] expected: PatternList,
    ) {
        let settings = Settings { include_patterns, exclude_patterns, ..Settings::default() };

        let result = SourceMatcher::new(PathBuf::from("/shop"), &settings);

        let Err(MatcherError::InvalidPattern { list, .. }) = result else {
            panic!("expected an invalid pattern error");
        };
        assert_that!(list, eq(expected));
        assert_that!(expected.to_string(), ends_with("Patterns"));
    }
}
