//! Keyword lookup and the walk over executable rows.

use std::path::PathBuf;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use rf_parser::model::executables::{is_end_text, ExecutableHolder, RowType};
use rf_parser::RobotFile;

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[$@&]\{[^}]*\}\s*=?\s*)+").expect("assignment pattern is valid")
});

static GHERKIN_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:given|when|then|and|but)\s+").expect("gherkin pattern is valid")
});

static EMBEDDED_ARGUMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{[^}]+\}").expect("embedded argument pattern is valid"));

// =============================================================================
// Name matching
// =============================================================================

/// Drop `${var} =` prefixes of a call that assigns its result.
pub fn strip_assignment(call: &str) -> &str {
    match ASSIGNMENT.find(call) {
        Some(m) => call[m.end()..].trim(),
        None => call.trim(),
    }
}

/// The call itself, then the call with each leading Gherkin word removed.
pub fn name_variants(call: &str) -> Vec<&str> {
    let mut variants = vec![call.trim()];
    let mut rest = call.trim();
    while let Some(m) = GHERKIN_PREFIX.find(rest) {
        rest = &rest[m.end()..];
        variants.push(rest);
    }
    variants
}

/// Case, spaces and underscores do not matter in keyword names.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Pattern for a name with embedded arguments, like `total is '${fee}'`.
fn embedded_pattern(definition: &str) -> Option<Regex> {
    if !EMBEDDED_ARGUMENT.is_match(definition) {
        return None;
    }
    let mut pattern = String::from("(?i)^");
    let mut last = 0;
    for m in EMBEDDED_ARGUMENT.find_iter(definition) {
        pattern.push_str(&regex::escape(&definition[last..m.start()]));
        pattern.push_str("(.+?)");
        last = m.end();
    }
    pattern.push_str(&regex::escape(&definition[last..]));
    pattern.push('$');
    Regex::new(&pattern).ok()
}

pub fn matches_keyword(definition: &str, call: &str) -> bool {
    if normalize(definition) == normalize(call) {
        return true;
    }
    embedded_pattern(definition.trim()).is_some_and(|re| re.is_match(call.trim()))
}

/// The user keyword of `file` a call refers to.
pub fn find_keyword<'f>(file: &'f RobotFile, call: &str) -> Option<&'f ExecutableHolder> {
    name_variants(call).into_iter().find_map(|variant| {
        file.keywords()
            .holders()
            .iter()
            .find(|holder| matches_keyword(&holder.name_text(), variant))
    })
}

// =============================================================================
// Executable steps
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Plain,
    Loop,
    LoopBody,
}

/// A row that produces a keyword event when run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// 1-based line.
    pub line: usize,
    pub kind: StepKind,
}

/// The rows of a holder that run, in order.
pub fn executable_steps(holder: &ExecutableHolder, tsv: bool) -> Vec<Step> {
    let mut steps = Vec::new();
    for row in holder.executable_rows() {
        let Some(line) = row.begin_line() else {
            continue;
        };
        let kind = match row.row_type() {
            RowType::For => StepKind::Loop,
            RowType::ForContinue => {
                let closes = row
                    .arguments()
                    .first()
                    .is_some_and(|a| is_end_text(a.borrow().text()));
                if closes || !row.is_executable(tsv) {
                    continue;
                }
                StepKind::LoopBody
            }
            _ => {
                if !row.is_executable(tsv) || is_end_text(&row.action_text()) {
                    continue;
                }
                StepKind::Plain
            }
        };
        steps.push(Step { line, kind });
    }
    steps
}

/// Result of one walk step. A loop carries its own line followed by its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stepped {
    pub line: usize,
    pub window: Vec<usize>,
}

/// Monotonic cursor over the steps of one holder.
#[derive(Debug, Clone, Default)]
pub struct StepWalker {
    steps: Vec<Step>,
    next: usize,
}

impl StepWalker {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps, next: 0 }
    }

    /// The next step, skipping over the body of a loop.
    pub fn advance(&mut self) -> Option<Stepped> {
        let step = *self.steps.get(self.next)?;
        self.next += 1;
        let mut window = Vec::new();
        if step.kind == StepKind::Loop {
            window.push(step.line);
            while let Some(body) = self
                .steps
                .get(self.next)
                .filter(|s| s.kind == StepKind::LoopBody)
            {
                window.push(body.line);
                self.next += 1;
            }
        }
        Some(Stepped {
            line: step.line,
            window,
        })
    }
}

// =============================================================================
// Sources
// =============================================================================

/// A parsed file keywords can be looked up in.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// File stem, the prefix of qualified calls.
    pub name: String,
    pub file: Rc<RobotFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Suite,
    Resource(usize),
}

/// A resolved user keyword.
#[derive(Debug, Clone)]
pub struct Definition {
    pub origin: Origin,
    pub path: PathBuf,
    pub steps: Vec<Step>,
}

/// The suite file and every resource it reaches.
#[derive(Debug, Clone)]
pub struct Sources {
    pub suite: SourceFile,
    pub resources: Vec<SourceFile>,
}

impl Sources {
    pub fn new(suite: SourceFile) -> Self {
        Self {
            suite,
            resources: Vec::new(),
        }
    }

    /// Add a resource unless a file with the same path is known.
    pub fn add_resource(&mut self, resource: SourceFile) {
        if !self.resources.iter().any(|r| r.path == resource.path) {
            self.resources.push(resource);
        }
    }

    /// Resolve a call to a user keyword.
    ///
    /// A `resource.Keyword` prefix wins, then the suite's own keywords, then
    /// the resource of the caller, then any resource.
    pub fn resolve(&self, call: &str, inherited: Option<usize>) -> Option<Definition> {
        let call = strip_assignment(call);
        for variant in name_variants(call) {
            if let Some(definition) = self.resolve_qualified(variant) {
                return Some(definition);
            }
        }
        if let Some(holder) = find_keyword(&self.suite.file, call) {
            return Some(self.definition(Origin::Suite, holder));
        }
        if let Some(index) = inherited {
            if let Some(holder) = self
                .resources
                .get(index)
                .and_then(|r| find_keyword(&r.file, call))
            {
                return Some(self.definition(Origin::Resource(index), holder));
            }
        }
        self.resources.iter().enumerate().find_map(|(index, r)| {
            find_keyword(&r.file, call).map(|holder| self.definition(Origin::Resource(index), holder))
        })
    }

    /// Same-named resources are told apart by which one has the keyword.
    fn resolve_qualified(&self, call: &str) -> Option<Definition> {
        for (dot, _) in call.match_indices('.') {
            let (prefix, rest) = (&call[..dot], &call[dot + 1..]);
            for (index, resource) in self.resources.iter().enumerate() {
                if !resource.name.eq_ignore_ascii_case(prefix) {
                    continue;
                }
                if let Some(holder) = find_keyword(&resource.file, rest) {
                    return Some(self.definition(Origin::Resource(index), holder));
                }
            }
        }
        None
    }

    fn definition(&self, origin: Origin, holder: &ExecutableHolder) -> Definition {
        let source = match origin {
            Origin::Suite => &self.suite,
            Origin::Resource(index) => self.resources.get(index).unwrap_or(&self.suite),
        };
        Definition {
            origin,
            path: source.path.clone(),
            steps: executable_steps(holder, source.file.is_tsv()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rf_parser::RobotParser;

    fn source(name: &str, text: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(format!("/suite/{name}.robot")),
            name: name.to_string(),
            file: Rc::new(RobotParser::parse(text).unwrap()),
        }
    }

    // =========================================================================
    // Names
    // =========================================================================

    #[test]
    fn test_strip_assignment() {
        assert_eq!(strip_assignment("${var} =    res.Keyword"), "res.Keyword");
        assert_eq!(strip_assignment("${a}    ${b}=    Get"), "Get");
        assert_eq!(strip_assignment("Log"), "Log");
    }

    #[test]
    fn test_gherkin_variants() {
        assert_eq!(
            name_variants("Given And total fee"),
            vec!["Given And total fee", "And total fee", "total fee"]
        );
        assert_eq!(name_variants("Gives up"), vec!["Gives up"]);
    }

    #[test]
    fn test_matching_ignores_case_spaces_and_underscores() {
        assert!(matches_keyword("My Keyword", "my_keyword"));
        assert!(matches_keyword("My Keyword", "MYKEYWORD"));
        assert!(!matches_keyword("My Keyword", "My Keywords"));
    }

    #[test]
    fn test_embedded_arguments() {
        assert!(matches_keyword("total fee is '${fee}'", "Total fee is '10.00'"));
        assert!(!matches_keyword("total fee is '${fee}'", "total fee was '10.00'"));
    }

    // =========================================================================
    // Steps
    // =========================================================================

    #[test]
    fn test_steps_skip_comments_and_end() {
        let file = RobotParser::parse(
            "*** Keywords ***\nKw\n    [Arguments]    ${a}\n    # note\n    FOR    ${i}    IN    a\n        Log    ${i}\n    END\n\n    No Operation\n",
        )
        .unwrap();
        let steps = executable_steps(&file.keywords().holders()[0], false);
        assert_eq!(
            steps,
            vec![
                Step { line: 5, kind: StepKind::Loop },
                Step { line: 6, kind: StepKind::LoopBody },
                Step { line: 9, kind: StepKind::Plain },
            ]
        );
    }

    #[test]
    fn test_walker_skips_loop_body() {
        let mut walker = StepWalker::new(vec![
            Step { line: 2, kind: StepKind::Plain },
            Step { line: 3, kind: StepKind::Loop },
            Step { line: 4, kind: StepKind::LoopBody },
            Step { line: 5, kind: StepKind::LoopBody },
            Step { line: 7, kind: StepKind::Plain },
        ]);
        assert_eq!(walker.advance().map(|s| s.line), Some(2));
        assert_eq!(
            walker.advance(),
            Some(Stepped {
                line: 3,
                window: vec![3, 4, 5]
            })
        );
        assert_eq!(walker.advance().map(|s| s.line), Some(7));
        assert_eq!(walker.advance(), None);
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn test_suite_keyword_wins_over_resource() {
        let mut sources = Sources::new(source("suite", "*** Keywords ***\nkey\n    Log    suite\n"));
        sources.add_resource(source("res", "*** Keywords ***\nkey\n    Log    res\n"));
        let definition = sources.resolve("key", Some(0)).unwrap();
        assert_eq!(definition.origin, Origin::Suite);

        let definition = sources.resolve("res.key", None).unwrap();
        assert_eq!(definition.origin, Origin::Resource(0));
    }

    #[test]
    fn test_same_named_resources_split_by_definition() {
        let mut sources = Sources::new(source("suite", "*** Test Cases ***\nT\n    Log    x\n"));
        let mut first = source("common", "*** Keywords ***\nOne\n    Log    1\n");
        first.path = PathBuf::from("/a/common.robot");
        let mut second = source("common", "*** Keywords ***\nTwo\n    Log    2\n");
        second.path = PathBuf::from("/b/common.robot");
        sources.add_resource(first);
        sources.add_resource(second);

        let definition = sources.resolve("common.Two", None).unwrap();
        assert_eq!(definition.path, PathBuf::from("/b/common.robot"));
    }

    #[test]
    fn test_dotted_resource_names() {
        let mut sources = Sources::new(source("suite", "*** Test Cases ***\nT\n    Log    x\n"));
        sources.add_resource(source("res", "*** Keywords ***\nOther\n    Log    1\n"));
        sources.add_resource(source("res.data", "*** Keywords ***\nPut\n    Log    put\n"));
        let definition = sources.resolve("res.data.Put", None).unwrap();
        assert_eq!(definition.origin, Origin::Resource(1));
    }

    #[test]
    fn test_library_keyword_is_unresolved() {
        let sources = Sources::new(source("suite", "*** Keywords ***\nkey\n    Log    x\n"));
        assert!(sources.resolve("BuiltIn.Log", None).is_none());
    }
}
