//! Follows runner events and maps each started keyword to its source line.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use rf_parser::model::executables::{ExecutableHolder, LocalSettingKind};
use rf_parser::model::{ModelElement, SettingKind};
use rf_parser::{ResourceImporter, RobotFile, RobotParser};

use crate::context::{FrameKind, KeywordContext, KeywordPosition, LoopWindow};
use crate::finder::{executable_steps, SourceFile, Sources, StepWalker, Stepped};

struct TestState {
    name: String,
    walker: StepWalker,
}

struct SuiteState {
    sources: Sources,
    test: Option<TestState>,
}

/// Debugger-side view of a running suite.
///
/// The runner reports suite, test and keyword starts and ends. Each keyword
/// start is matched to the row that invoked it, so a debugger can show the
/// current line without help from the runner.
pub struct RobotDebugExecutionContext<'p> {
    importer: Option<ResourceImporter<'p>>,
    pending_imports: Vec<PathBuf>,
    suite: Option<SuiteState>,
    in_test: bool,
    stack: Vec<KeywordContext>,
    for_depth: usize,
}

impl Default for RobotDebugExecutionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p> RobotDebugExecutionContext<'p> {
    pub fn new() -> Self {
        Self {
            importer: None,
            pending_imports: Vec::new(),
            suite: None,
            in_test: false,
            stack: Vec::new(),
            for_depth: 0,
        }
    }

    // =========================================================================
    // Suite and test events
    // =========================================================================

    /// A resource import reported by the runner.
    ///
    /// Before the suite starts the path is queued, afterwards it is loaded
    /// right away.
    pub fn resource_import(&mut self, path: &Path) {
        if self.suite.is_none() {
            self.pending_imports.push(path.to_path_buf());
            return;
        }
        self.load_resource(path);
    }

    pub fn start_suite(&mut self, path: &Path, parser: &'p RobotParser) {
        self.reset_suite();
        let file = match parser.parse_file(path) {
            Ok(file) => Rc::new(file),
            Err(e) => {
                log::warn!("Unable to parse suite {}: {e}", path.display());
                return;
            }
        };
        let mut importer = ResourceImporter::new(parser);
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut sources = Sources::new(SourceFile {
            path: path.to_path_buf(),
            name: file_stem(path),
            file: Rc::clone(&file),
        });
        for reference in importer.resolve(&file, &base_dir) {
            for resolved in reference.flatten() {
                sources.add_resource(SourceFile {
                    path: resolved.path.clone(),
                    name: resolved.name(),
                    file: Rc::clone(&resolved.file),
                });
            }
        }
        log::debug!(
            "Started suite {} with {} resource(s)",
            path.display(),
            sources.resources.len()
        );
        self.importer = Some(importer);
        self.suite = Some(SuiteState {
            sources,
            test: None,
        });
        for pending in std::mem::take(&mut self.pending_imports) {
            self.load_resource(&pending);
        }
    }

    pub fn end_suite(&mut self) {
        self.reset_suite();
    }

    /// Start a test or task by name, ignoring case.
    ///
    /// Returns `false` when the running suite has no such test.
    pub fn start_test(&mut self, name: &str) -> bool {
        self.stack.clear();
        self.for_depth = 0;
        self.in_test = true;
        let Some(suite) = self.suite.as_mut() else {
            return false;
        };
        let file = &suite.sources.suite.file;
        let Some(holder) = find_test(file, name) else {
            log::debug!("Test '{name}' not found in {}", file.display_path());
            suite.test = None;
            return false;
        };
        suite.test = Some(TestState {
            name: holder.name_text(),
            walker: StepWalker::new(executable_steps(holder, file.is_tsv())),
        });
        true
    }

    pub fn end_test(&mut self) {
        self.in_test = false;
        self.stack.clear();
        self.for_depth = 0;
        if let Some(suite) = self.suite.as_mut() {
            suite.test = None;
        }
    }

    // =========================================================================
    // Keyword events
    // =========================================================================

    pub fn start_keyword(&mut self, name: &str, keyword_type: &str, args: &[String]) {
        let parent = self.stack.last().map(|f| f.kind);
        let kind = FrameKind::classify(keyword_type, parent);
        let mut frame = KeywordContext::new(name, keyword_type, args, kind);
        if kind == FrameKind::Loop {
            self.for_depth += 1;
        }
        frame.position = self.locate(&mut frame);
        log::trace!(
            "{}{} '{name}' at {:?}",
            "  ".repeat(self.stack.len()),
            keyword_type,
            frame.position
        );
        self.stack.push(frame);
    }

    /// Close the innermost keyword.
    ///
    /// Events arrive well nested, so the stack decides which frame closes.
    /// A type that differs from the frame's is only logged.
    pub fn end_keyword(&mut self, keyword_type: &str) {
        let Some(frame) = self.stack.pop() else {
            log::debug!("End of {keyword_type} without a running keyword");
            return;
        };
        if !frame.keyword_type.trim().eq_ignore_ascii_case(keyword_type.trim()) {
            log::debug!(
                "End of {keyword_type} closed '{}' of type {}",
                frame.name,
                frame.keyword_type
            );
        }
        if frame.kind == FrameKind::Loop {
            self.for_depth = self.for_depth.saturating_sub(1);
        }
    }

    /// Position of the most recently started keyword that is still running.
    ///
    /// Repeated calls give the same answer.
    pub fn find_keyword_position(&self) -> Option<KeywordPosition> {
        self.stack.last()?.position.clone()
    }

    pub fn current_keyword(&self) -> Option<&KeywordContext> {
        self.stack.last()
    }

    pub fn keyword_stack(&self) -> &[KeywordContext] {
        &self.stack
    }

    /// Number of loops currently open.
    pub fn for_depth(&self) -> usize {
        self.for_depth
    }

    pub fn is_in_test(&self) -> bool {
        self.in_test
    }

    pub fn current_test(&self) -> Option<&str> {
        self.suite.as_ref()?.test.as_ref().map(|t| t.name.as_str())
    }

    pub fn suite_path(&self) -> Option<&Path> {
        self.suite.as_ref().map(|s| s.sources.suite.path.as_path())
    }

    /// Resource files known to the running suite.
    pub fn resource_paths(&self) -> Vec<&Path> {
        self.suite
            .as_ref()
            .map(|s| s.sources.resources.iter().map(|r| r.path.as_path()).collect())
            .unwrap_or_default()
    }

    // =========================================================================
    // Keyword types
    // =========================================================================

    /// `Setup` and `Teardown` mean the suite's own outside of a test.
    pub fn is_suite_setup_teardown_keyword(&self, keyword_type: &str) -> bool {
        let lowered = keyword_type.trim().to_lowercase();
        match lowered.as_str() {
            "suite setup" | "suite teardown" => true,
            "setup" | "teardown" => !self.in_test,
            _ => false,
        }
    }

    pub fn is_test_case_setup_keyword(&self, keyword_type: &str) -> bool {
        let lowered = keyword_type.trim().to_lowercase();
        match lowered.as_str() {
            "test setup" => true,
            "setup" => self.in_test,
            _ => false,
        }
    }

    pub fn is_test_case_teardown_keyword(&self, keyword_type: &str) -> bool {
        let lowered = keyword_type.trim().to_lowercase();
        match lowered.as_str() {
            "test teardown" => true,
            "teardown" => self.in_test,
            _ => false,
        }
    }

    // =========================================================================
    // Finders
    // =========================================================================

    fn locate(&mut self, frame: &mut KeywordContext) -> Option<KeywordPosition> {
        let suite = self.suite.as_mut()?;
        let Some(parent_index) = self.stack.len().checked_sub(1) else {
            return match frame.kind {
                FrameKind::Setup | FrameKind::Teardown => {
                    setup_teardown_position(suite, frame.kind, self.in_test)
                }
                _ => {
                    let test = suite.test.as_mut()?;
                    let stepped = test.walker.advance()?;
                    Some(place(frame, &suite.sources.suite.path, stepped))
                }
            };
        };

        match self.stack[parent_index].kind {
            FrameKind::Loop => {
                let window = self.stack[parent_index].window.as_mut()?;
                window.restart();
                window.next_position()
            }
            FrameKind::LoopItem => {
                let loop_index = parent_index.checked_sub(1)?;
                self.stack[loop_index].window.as_mut()?.next_position()
            }
            FrameKind::Keyword | FrameKind::Setup | FrameKind::Teardown => {
                // Keywords stepped into from a loop body are not followed.
                if self.stack[..parent_index]
                    .iter()
                    .any(|f| f.kind == FrameKind::LoopItem)
                {
                    return None;
                }
                if !self.stack[parent_index].is_resolved() {
                    let inherited = self.stack[..parent_index]
                        .iter()
                        .rev()
                        .find_map(KeywordContext::resource);
                    let definition = suite
                        .sources
                        .resolve(&self.stack[parent_index].name, inherited);
                    self.stack[parent_index].set_definition(definition);
                }
                let parent = &mut self.stack[parent_index];
                let path = parent.definition()?.path.clone();
                match parent.walker_mut().advance() {
                    Some(stepped) => Some(place(frame, &path, stepped)),
                    None => Some(KeywordPosition::new(&path, None)),
                }
            }
        }
    }

    fn load_resource(&mut self, path: &Path) {
        let (Some(importer), Some(suite)) = (self.importer.as_mut(), self.suite.as_mut()) else {
            return;
        };
        match importer.load(path) {
            Ok(file) => suite.sources.add_resource(SourceFile {
                path: path.to_path_buf(),
                name: file_stem(path),
                file,
            }),
            Err(e) => log::warn!("{e}"),
        }
    }

    fn reset_suite(&mut self) {
        self.importer = None;
        self.suite = None;
        self.in_test = false;
        self.stack.clear();
        self.for_depth = 0;
    }
}

/// Position of a stepped row, opening a loop window when the row is a loop.
fn place(frame: &mut KeywordContext, path: &Path, stepped: Stepped) -> KeywordPosition {
    if frame.kind == FrameKind::Loop && !stepped.window.is_empty() {
        frame.window = Some(LoopWindow::new(path, stepped.window));
    }
    KeywordPosition::new(path, Some(stepped.line))
}

fn setup_teardown_position(
    suite: &SuiteState,
    kind: FrameKind,
    in_test: bool,
) -> Option<KeywordPosition> {
    let source = &suite.sources.suite;
    let teardown = kind == FrameKind::Teardown;
    let element: Option<&dyn ModelElement> = if in_test {
        let local_kind = if teardown {
            LocalSettingKind::Teardown
        } else {
            LocalSettingKind::Setup
        };
        let table_kind = if teardown {
            SettingKind::TestTeardown
        } else {
            SettingKind::TestSetup
        };
        let local = suite
            .test
            .as_ref()
            .and_then(|t| find_test(&source.file, &t.name))
            .and_then(|holder| holder.setting(local_kind));
        match local {
            Some(setting) => Some(setting as &dyn ModelElement),
            None => source
                .file
                .settings()
                .find(table_kind)
                .map(|s| s as &dyn ModelElement),
        }
    } else {
        let table_kind = if teardown {
            SettingKind::SuiteTeardown
        } else {
            SettingKind::SuiteSetup
        };
        source
            .file
            .settings()
            .find(table_kind)
            .map(|s| s as &dyn ModelElement)
    };
    let line = element?.begin_position()?.line;
    Some(KeywordPosition::new(&source.path, Some(line)))
}

fn find_test<'f>(file: &'f RobotFile, name: &str) -> Option<&'f ExecutableHolder> {
    file.test_cases()
        .find(name)
        .or_else(|| file.tasks().find(name))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const SUITE: &str = "\
*** Settings ***
Resource    res.resource
Test Setup    Prepare
Suite Teardown    Clean Up

*** Test Cases ***
First
    Log    one
    # comment
    Given greet \"Bob\"
    FOR    ${i}    IN    a    b
        Log    ${i}
        Helper
    END
    ${x} =    res.Shared
Second
    [Setup]    Local Setup
    Log    two

*** Keywords ***
greet \"${who}\"
    Log    hello ${who}
    Log    bye
Helper
    No Operation
";

    const RESOURCE: &str = "\
*** Keywords ***
Shared
    Log    shared
    Inner
Inner
    Log    inner
";

    fn fixture() -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("res.resource"), RESOURCE).unwrap();
        let suite = dir.path().join("suite.robot");
        fs::write(&suite, SUITE).unwrap();
        (dir, suite)
    }

    fn start(context: &mut RobotDebugExecutionContext, name: &str, keyword_type: &str) -> Option<usize> {
        context.start_keyword(name, keyword_type, &[]);
        context.find_keyword_position().and_then(|p| p.line)
    }

    // =========================================================================
    // Test case walk
    // =========================================================================

    #[test]
    fn test_rows_of_a_test_in_order() {
        let (dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        assert!(context.start_test("first"));
        assert_eq!(context.current_test(), Some("First"));

        assert_eq!(start(&mut context, "Prepare", "Setup"), Some(3));
        context.end_keyword("Setup");

        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), Some(8));
        assert_eq!(
            context.find_keyword_position(),
            Some(KeywordPosition::new(&suite, Some(8)))
        );
        context.end_keyword("Keyword");

        assert_eq!(start(&mut context, "Given greet \"Bob\"", "Keyword"), Some(10));
        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), Some(22));
        context.end_keyword("Keyword");
        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), Some(23));
        context.end_keyword("Keyword");
        context.end_keyword("Keyword");

        assert_eq!(start(&mut context, "${i} IN [ a | b ]", "For"), Some(11));
        context.end_keyword("For");

        assert_eq!(start(&mut context, "${x} = res.Shared", "Keyword"), Some(15));
        assert_eq!(
            context.find_keyword_position().map(|p| p.path),
            Some(suite.clone())
        );
        let resource = dir.path().join("res.resource");
        context.start_keyword("BuiltIn.Log", "Keyword", &[]);
        assert_eq!(
            context.find_keyword_position(),
            Some(KeywordPosition::new(&resource, Some(3)))
        );
        context.end_keyword("Keyword");
        assert_eq!(start(&mut context, "Inner", "Keyword"), Some(4));
        context.start_keyword("BuiltIn.Log", "Keyword", &[]);
        assert_eq!(
            context.find_keyword_position(),
            Some(KeywordPosition::new(&resource, Some(6)))
        );
    }

    #[test]
    fn test_position_is_idempotent() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("Second");
        context.start_keyword("Local Setup", "Setup", &[]);
        context.end_keyword("Setup");
        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), Some(18));
        assert_eq!(context.find_keyword_position().and_then(|p| p.line), Some(18));
        assert_eq!(context.find_keyword_position().and_then(|p| p.line), Some(18));
    }

    // =========================================================================
    // Loops
    // =========================================================================

    #[test]
    fn test_loop_window_wraps_per_iteration() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("First");
        for (name, keyword_type) in [("Log", "Keyword"), ("Given greet \"Bob\"", "Keyword")] {
            context.start_keyword(name, keyword_type, &[]);
            context.end_keyword(keyword_type);
        }

        assert_eq!(start(&mut context, "${i} IN [ a | b ]", "For"), Some(11));
        assert_eq!(context.for_depth(), 1);

        assert_eq!(start(&mut context, "${i} = a", "For Item"), Some(11));
        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), Some(12));
        context.end_keyword("Keyword");
        assert_eq!(start(&mut context, "Helper", "Keyword"), Some(13));
        assert_eq!(start(&mut context, "BuiltIn.No Operation", "Keyword"), None);
        context.end_keyword("Keyword");
        context.end_keyword("Keyword");
        context.end_keyword("For Item");

        assert_eq!(start(&mut context, "${i} = b", "For Item"), Some(11));
        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), Some(12));
        context.end_keyword("Keyword");
        context.end_keyword("For Item");
        context.end_keyword("For");
        assert_eq!(context.for_depth(), 0);

        assert_eq!(start(&mut context, "${x} = res.Shared", "Keyword"), Some(15));
    }

    #[test]
    fn test_each_iteration_starts_at_loop_row() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("First");
        for name in ["Log", "Given greet \"Bob\""] {
            context.start_keyword(name, "Keyword", &[]);
            context.end_keyword("Keyword");
        }
        context.start_keyword("${i} IN [ a | b | c ]", "For", &[]);

        let mut lines = Vec::new();
        for item in ["a", "b", "c"] {
            lines.push(start(&mut context, &format!("${{i}} = {item}"), "For Item"));
            lines.push(start(&mut context, "BuiltIn.Log", "Keyword"));
            context.end_keyword("Keyword");
            context.end_keyword("For Item");
        }
        assert_eq!(
            lines,
            vec![Some(11), Some(12), Some(11), Some(12), Some(11), Some(12)]
        );
    }

    #[test]
    fn test_end_keyword_pops_whatever_type_is_given() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("First");
        context.start_keyword("${i} IN [ a ]", "For", &[]);
        context.end_keyword("Keyword");
        assert!(context.keyword_stack().is_empty());
        assert_eq!(context.for_depth(), 0);
        context.end_keyword("Keyword");
        assert!(context.keyword_stack().is_empty());
    }

    // =========================================================================
    // Setup and teardown
    // =========================================================================

    const TEARDOWNS: &str = "\
*** Settings ***
Test Teardown    Tidy

*** Test Cases ***
Plain
    Log    a
Own
    [Teardown]    Own Tidy
    Log    b
";

    #[test]
    fn test_teardown_falls_back_to_settings_table() {
        let dir = tempfile::tempdir().unwrap();
        let suite = dir.path().join("teardowns.robot");
        fs::write(&suite, TEARDOWNS).unwrap();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);

        assert!(context.start_test("Plain"));
        assert_eq!(start(&mut context, "Log", "Keyword"), Some(6));
        context.end_keyword("Keyword");
        assert_eq!(start(&mut context, "Tidy", "Teardown"), Some(2));
        context.end_keyword("Teardown");
        assert_eq!(start(&mut context, "Tidy", "Test Teardown"), Some(2));
        context.end_test();

        assert!(context.start_test("Own"));
        assert_eq!(start(&mut context, "Log", "Keyword"), Some(9));
        context.end_keyword("Keyword");
        assert_eq!(start(&mut context, "Own Tidy", "Teardown"), Some(8));
    }

    #[test]
    fn test_local_setup_wins_over_settings_table() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("Second");
        assert_eq!(start(&mut context, "Local Setup", "Setup"), Some(17));
        context.end_keyword("Setup");
        assert_eq!(start(&mut context, "Log", "Keyword"), Some(18));
    }

    #[test]
    fn test_suite_teardown_outside_test() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("Second");
        context.end_test();
        assert_eq!(start(&mut context, "Clean Up", "Teardown"), Some(4));
        context.end_keyword("Teardown");
        assert_eq!(start(&mut context, "Missing", "Suite Setup"), None);
    }

    #[test]
    fn test_keyword_type_checks() {
        let mut context = RobotDebugExecutionContext::new();
        assert!(context.is_suite_setup_teardown_keyword("Suite Setup"));
        assert!(context.is_suite_setup_teardown_keyword("teardown"));
        assert!(!context.is_test_case_teardown_keyword("Teardown"));
        assert!(context.is_test_case_teardown_keyword("Test Teardown"));

        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        context.start_suite(&suite, &parser);
        context.start_test("First");
        assert!(!context.is_suite_setup_teardown_keyword("Setup"));
        assert!(context.is_suite_setup_teardown_keyword("Suite Teardown"));
        assert!(context.is_test_case_teardown_keyword("Teardown"));
        assert!(context.is_test_case_setup_keyword("Setup"));
        assert!(!context.is_test_case_setup_keyword("Keyword"));
    }

    // =========================================================================
    // Unresolved keywords
    // =========================================================================

    #[test]
    fn test_library_keyword_children_have_no_position() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("First");
        context.start_keyword("BuiltIn.Run Keyword", "Keyword", &[]);
        assert_eq!(start(&mut context, "BuiltIn.Log", "Keyword"), None);
    }

    #[test]
    fn test_exhausted_definition_gives_path_without_line() {
        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&suite, &parser);
        context.start_test("First");
        context.start_keyword("Log", "Keyword", &[]);
        context.end_keyword("Keyword");
        context.start_keyword("Given greet \"Bob\"", "Keyword", &[]);
        for _ in 0..2 {
            context.start_keyword("Log", "Keyword", &[]);
            context.end_keyword("Keyword");
        }
        context.start_keyword("Log", "Keyword", &[]);
        assert_eq!(
            context.find_keyword_position(),
            Some(KeywordPosition::new(&suite, None))
        );
    }

    #[test]
    fn test_unknown_test_and_no_suite() {
        let mut context = RobotDebugExecutionContext::new();
        assert!(!context.start_test("First"));
        assert_eq!(start(&mut context, "Log", "Keyword"), None);

        let (_dir, suite) = fixture();
        let parser = RobotParser::default();
        context.start_suite(&suite, &parser);
        assert!(!context.start_test("Nope"));
        assert_eq!(start(&mut context, "Log", "Keyword"), None);
    }

    #[test]
    fn test_unparsable_suite_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.start_suite(&dir.path().join("missing.robot"), &parser);
        assert_eq!(context.suite_path(), None);
    }

    // =========================================================================
    // Resource imports
    // =========================================================================

    #[test]
    fn test_runtime_resource_import() {
        let (dir, suite) = fixture();
        let extra = dir.path().join("extra.resource");
        fs::write(&extra, "*** Keywords ***\nExtra\n    Log    extra\n").unwrap();
        let late = dir.path().join("late.resource");
        fs::write(&late, "*** Keywords ***\nLate\n    Log    late\n").unwrap();

        let parser = RobotParser::default();
        let mut context = RobotDebugExecutionContext::new();
        context.resource_import(&extra);
        context.start_suite(&suite, &parser);
        context.resource_import(&late);
        context.resource_import(&late);
        assert_eq!(
            context.resource_paths(),
            vec![
                dir.path().join("res.resource").as_path(),
                extra.as_path(),
                late.as_path()
            ]
        );

        context.start_test("First");
        context.start_keyword("Late", "Keyword", &[]);
        context.start_keyword("Log", "Keyword", &[]);
        assert_eq!(
            context.find_keyword_position(),
            Some(KeywordPosition::new(&late, Some(3)))
        );
    }
}
