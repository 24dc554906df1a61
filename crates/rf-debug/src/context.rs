//! Frames of the keyword stack.

use std::path::{Path, PathBuf};

use crate::finder::{Definition, Origin, StepWalker};

/// Where a running keyword is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordPosition {
    pub path: PathBuf,
    /// 1-based line, `None` once the definition has no rows left to match.
    pub line: Option<usize>,
}

impl KeywordPosition {
    pub fn new(path: &Path, line: Option<usize>) -> Self {
        Self {
            path: path.to_path_buf(),
            line,
        }
    }
}

/// Role of a frame, taken from the keyword type the runner reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Keyword,
    Setup,
    Teardown,
    Loop,
    LoopItem,
}

impl FrameKind {
    /// Any direct child of a loop is one of its iterations.
    pub fn classify(keyword_type: &str, parent: Option<FrameKind>) -> Self {
        if parent == Some(FrameKind::Loop) {
            return FrameKind::LoopItem;
        }
        let lowered = keyword_type.trim().to_lowercase();
        if lowered == "for" || lowered.ends_with(" for") {
            FrameKind::Loop
        } else if lowered.contains("setup") {
            FrameKind::Setup
        } else if lowered.contains("teardown") {
            FrameKind::Teardown
        } else {
            FrameKind::Keyword
        }
    }
}

/// Lines of a loop and its body, visited in a cycle.
#[derive(Debug, Clone)]
pub struct LoopWindow {
    path: PathBuf,
    lines: Vec<usize>,
    cursor: usize,
}

impl LoopWindow {
    pub fn new(path: &Path, lines: Vec<usize>) -> Self {
        Self {
            path: path.to_path_buf(),
            lines,
            cursor: 0,
        }
    }

    /// Go back to the loop row, as a new iteration starts.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    pub fn next_position(&mut self) -> Option<KeywordPosition> {
        if self.lines.is_empty() {
            return None;
        }
        let line = self.lines[self.cursor % self.lines.len()];
        self.cursor += 1;
        Some(KeywordPosition::new(&self.path, Some(line)))
    }
}

/// One started keyword.
#[derive(Debug, Clone)]
pub struct KeywordContext {
    pub name: String,
    pub keyword_type: String,
    pub args: Vec<String>,
    pub kind: FrameKind,
    pub(crate) position: Option<KeywordPosition>,
    pub(crate) window: Option<LoopWindow>,
    resolved: bool,
    definition: Option<Definition>,
    walker: StepWalker,
}

impl KeywordContext {
    pub fn new(name: &str, keyword_type: &str, args: &[String], kind: FrameKind) -> Self {
        Self {
            name: name.to_string(),
            keyword_type: keyword_type.to_string(),
            args: args.to_vec(),
            kind,
            position: None,
            window: None,
            resolved: false,
            definition: None,
            walker: StepWalker::default(),
        }
    }

    pub fn position(&self) -> Option<&KeywordPosition> {
        self.position.as_ref()
    }

    pub fn definition(&self) -> Option<&Definition> {
        self.definition.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn set_definition(&mut self, definition: Option<Definition>) {
        self.walker = definition
            .as_ref()
            .map(|d| StepWalker::new(d.steps.clone()))
            .unwrap_or_default();
        self.definition = definition;
        self.resolved = true;
    }

    pub(crate) fn walker_mut(&mut self) -> &mut StepWalker {
        &mut self.walker
    }

    /// Index of the resource this frame's keyword comes from.
    pub fn resource(&self) -> Option<usize> {
        match self.definition.as_ref()?.origin {
            Origin::Resource(index) => Some(index),
            Origin::Suite => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_types() {
        assert_eq!(FrameKind::classify("Keyword", None), FrameKind::Keyword);
        assert_eq!(FrameKind::classify("Test For", None), FrameKind::Loop);
        assert_eq!(FrameKind::classify("FOR", None), FrameKind::Loop);
        assert_eq!(FrameKind::classify("Test Foritem", None), FrameKind::Keyword);
        assert_eq!(FrameKind::classify("Suite Setup", None), FrameKind::Setup);
        assert_eq!(FrameKind::classify("Teardown", None), FrameKind::Teardown);
        assert_eq!(
            FrameKind::classify("Keyword", Some(FrameKind::Loop)),
            FrameKind::LoopItem
        );
    }

    #[test]
    fn test_window_wraps_around() {
        let mut window = LoopWindow::new(Path::new("/s.robot"), vec![6, 7, 8]);
        let lines: Vec<Option<usize>> = (0..5)
            .map(|_| window.next_position().and_then(|p| p.line))
            .collect();
        assert_eq!(lines, vec![Some(6), Some(7), Some(8), Some(6), Some(7)]);
    }

    #[test]
    fn test_restart_returns_to_loop_row() {
        let mut window = LoopWindow::new(Path::new("/s.robot"), vec![6, 7, 8]);
        window.next_position();
        window.next_position();
        window.restart();
        assert_eq!(window.next_position().and_then(|p| p.line), Some(6));
        assert_eq!(window.next_position().and_then(|p| p.line), Some(7));
    }

    #[test]
    fn test_empty_window() {
        let mut window = LoopWindow::new(Path::new("/s.robot"), Vec::new());
        assert_eq!(window.next_position(), None);
    }
}
