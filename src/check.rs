//! Content validation without writing output.
//!
//! `check` confirms that every partial any page refers to exists and is
//! called with the right number of arguments, and that every page source
//! loaded. Unlike the generate stage it does not stop at the first problem in
//! a page: each marker is checked on its own, so one run lists everything
//! that needs fixing.

use crate::partials::PartialRegistry;
use crate::render::{self, RenderError};
use crate::scan::Manifest;
use crate::template::Template;
use crate::types::SkipReason;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemKind {
    Render(RenderError),
    /// The page never made it into the manifest.
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub source_path: String,
    pub kind: ProblemKind,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ProblemKind::Render(e) => write!(f, "{}: {}", self.source_path, e),
            ProblemKind::Skipped(reason) => write!(f, "{}: {}", self.source_path, reason),
        }
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    pub pages_checked: usize,
    pub problems: Vec<Problem>,
    /// User partials that no page includes.
    pub unused_partials: Vec<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

pub fn check(manifest: &Manifest, registry: &PartialRegistry) -> CheckReport {
    let mut problems = Vec::new();
    let mut used: BTreeSet<String> = BTreeSet::new();

    for skipped in manifest.invalid_pages() {
        problems.push(Problem {
            source_path: skipped.source_path.clone(),
            kind: ProblemKind::Skipped(skipped.reason.clone()),
        });
    }

    for page in &manifest.pages {
        let mut report = |error: RenderError| {
            problems.push(Problem {
                source_path: page.source_path.clone(),
                kind: ProblemKind::Render(error),
            })
        };

        let includes = match Template::parse(&page.body) {
            Ok(template) => template.includes().cloned().collect(),
            Err(e) => {
                report(e);
                Vec::new()
            }
        };

        for include in includes
            .into_iter()
            .chain(render::shell_includes(page, registry))
        {
            if let Err(e) = registry.check(&include) {
                report(e);
            }
            used.insert(include.name);
        }
    }

    let unused_partials = registry
        .iter()
        .filter(|(name, partial)| !partial.is_builtin() && !used.contains(*name))
        .map(|(name, _)| name.to_string())
        .collect();

    CheckReport {
        pages_checked: manifest.pages.len(),
        problems,
        unused_partials,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partials::Partial;
    use crate::scan::scan;
    use crate::test_helpers::*;
    use std::fs;

    fn fixture_registry(manifest: &Manifest) -> PartialRegistry {
        PartialRegistry::builtin(&manifest.config).with_partial(
            "related",
            Partial::Fragment("<aside></aside>".into()),
        )
    }

    #[test]
    fn fixture_site_is_clean() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let report = check(&manifest, &fixture_registry(&manifest));

        assert!(report.is_ok(), "{:?}", report.problems);
        assert_eq!(report.pages_checked, 3);
        assert!(report.unused_partials.is_empty());
    }

    #[test]
    fn reports_every_unknown_partial() {
        let tmp = setup_fixtures();
        fs::write(
            tmp.path().join("pages/broken.html"),
            "+++\ntitle = \"B\"\ndate = \"d\"\n+++\n{% include sidebar %}\n{% include ads %}\n",
        )
        .unwrap();
        let manifest = scan(tmp.path()).unwrap();
        let report = check(&manifest, &fixture_registry(&manifest));

        let kinds: Vec<&ProblemKind> = report.problems.iter().map(|p| &p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &ProblemKind::Render(RenderError::UnknownPartial("sidebar".into())),
                &ProblemKind::Render(RenderError::UnknownPartial("ads".into())),
            ]
        );
        assert!(report.problems.iter().all(|p| p.source_path == "broken.html"));
    }

    #[test]
    fn reports_malformed_body() {
        let tmp = setup_fixtures();
        fs::write(
            tmp.path().join("pages/broken.html"),
            "+++\ntitle = \"B\"\ndate = \"d\"\n+++\n<p>\n{% include related\n",
        )
        .unwrap();
        let manifest = scan(tmp.path()).unwrap();
        let report = check(&manifest, &fixture_registry(&manifest));

        assert_eq!(report.problems.len(), 1);
        assert!(matches!(
            report.problems[0].kind,
            ProblemKind::Render(RenderError::MalformedContent { line: 2, .. })
        ));
    }

    #[test]
    fn reports_invalid_sources_but_not_drafts() {
        let tmp = setup_fixtures();
        fs::write(tmp.path().join("pages/bad.md"), "no front matter").unwrap();
        let manifest = scan(tmp.path()).unwrap();
        let report = check(&manifest, &fixture_registry(&manifest));

        assert_eq!(report.problems.len(), 1);
        assert_eq!(report.problems[0].source_path, "bad.md");
        assert!(matches!(report.problems[0].kind, ProblemKind::Skipped(_)));
    }

    #[test]
    fn reports_duplicate_output_as_skipped_problem() {
        let tmp = setup_fixtures();
        fs::write(
            tmp.path().join("pages/blog/index.html"),
            "+++\ntitle = \"Blog\"\ndate = \"d\"\n+++\n<p>blog</p>\n",
        )
        .unwrap();
        let manifest = scan(tmp.path()).unwrap();
        let report = check(&manifest, &fixture_registry(&manifest));

        assert_eq!(
            report.problems,
            vec![Problem {
                source_path: "blog/index.md".into(),
                kind: ProblemKind::Skipped(SkipReason::DuplicateOutput("blog/index.html".into())),
            }]
        );
    }

    #[test]
    fn markdown_quoted_arguments_are_checked() {
        let tmp = setup_fixtures();
        fs::write(
            tmp.path().join("pages/notes.md"),
            "+++\ntitle = \"Notes\"\ndate = \"d\"\n+++\n# Notes\n\nSee {% include navbar \"blog\" \"x\" %}\n",
        )
        .unwrap();
        let manifest = scan(tmp.path()).unwrap();
        let report = check(&manifest, &fixture_registry(&manifest));

        assert_eq!(report.problems.len(), 1);
        assert_eq!(
            report.problems[0].kind,
            ProblemKind::Render(RenderError::InvalidArguments {
                partial: "navbar".into(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn reports_unused_user_partials() {
        let tmp = setup_fixtures();
        let manifest = scan(tmp.path()).unwrap();
        let registry = fixture_registry(&manifest)
            .with_partial("sidebar", Partial::Fragment("<nav></nav>".into()));
        let report = check(&manifest, &registry);

        assert!(report.is_ok());
        assert_eq!(report.unused_partials, vec!["sidebar"]);
    }

    #[test]
    fn problem_display_names_page() {
        let problem = Problem {
            source_path: "blog/index.md".into(),
            kind: ProblemKind::Render(RenderError::UnknownPartial("sidebar".into())),
        };
        assert_eq!(problem.to_string(), "blog/index.md: Unknown partial: sidebar");
    }
}
